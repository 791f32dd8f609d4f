//! # Shared Types
//!
//! Bitcoin primitives and identifiers passed between the round aggregate,
//! the event store and the coordination service.
//!
//! Anything that feeds a content-derived idempotency token implements
//! [`ContentHash`], which hashes length-prefixed canonical fields so the
//! token never depends on memory layout or map order. [`AliceId`] is a random
//! participant secret, never derived from public data.

pub mod entities;
pub mod errors;
pub mod identifiers;

pub use entities::*;
pub use errors::*;
pub use identifiers::*;
pub use uuid::Uuid;
