//! Domain services exposed to outer callers.
//!
//! # Responsibility
//! - Give callers entity-level entry points that hide the chosen backend.
//!
//! # Invariants
//! - Services forward to their repository without adding behavior.

pub mod book_service;
