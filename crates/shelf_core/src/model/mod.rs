//! Entity model shared by every persisted collection.
//!
//! # Invariants
//! - Identity and lifecycle timestamps live in [`entity::EntityMeta`] and are
//!   flattened into each stored document.
//! - `deleted_at` is the sole live/deleted discriminator.

pub mod book;
pub mod entity;
