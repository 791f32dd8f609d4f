//! # Properties
//!
//! Invariants checked over generated command traces and registrations.

pub mod quotas;
pub mod replay;

#[cfg(test)]
pub(crate) mod walk;
