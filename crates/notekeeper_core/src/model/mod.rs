//! Domain records for users and their notes.
//!
//! # Invariants
//! - Every note references exactly one author for its whole lifetime.
//! - Ids are storage-assigned and increase with creation order.

pub mod note;
pub mod user;
