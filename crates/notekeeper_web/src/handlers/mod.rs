//! Request handlers, one module per page group.

pub mod auth;
pub mod notes;
