//! # WabiSabi Coordinator Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── integration/        # Cross-crate flows
//! │   ├── round_flows.rs        # Processor + event store
//! │   └── coordinator_flows.rs  # Full service with in-memory collaborators
//! │
//! └── properties/         # Property-based tests (proptest)
//!     ├── replay.rs             # Fold determinism, idempotent retries
//!     └── quotas.rs             # Vsize / amount allocation bounds
//!
//! tests/benches/
//! └── round_benchmarks.rs # Command throughput (criterion)
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ws-tests
//!
//! # By category
//! cargo test -p ws-tests integration::
//! cargo test -p ws-tests properties::
//!
//! # Benchmarks
//! cargo bench -p ws-tests
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod properties;
