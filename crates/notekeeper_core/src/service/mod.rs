//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate policy checks and repository calls into use-case APIs.
//! - Keep the web layer free of storage and ownership rules.

pub mod note_service;
