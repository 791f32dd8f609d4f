//! # WS-02 Event Store
//!
//! Event-sourcing plumbing for coordinator aggregates.
//!
//! ## Purpose
//!
//! Runs commands against aggregates whose state is derived only by folding
//! their event log. The store owns three guarantees that the command
//! processors rely on:
//!
//! | Guarantee | Enforcement Location |
//! |-----------|---------------------|
//! | Single writer per aggregate | `adapters/memory.rs` - per-aggregate async mutex held across processing |
//! | Idempotent delivery | `adapters/memory.rs` - per-aggregate cache of committed results by token |
//! | All-or-nothing commit | `adapters/memory.rs` - events folded onto a working copy before append |
//!
//! Commands against different aggregates never contend on the same lock and
//! run fully in parallel.
//!
//! ## Command Flow
//!
//! ```text
//! process_command(cmd, id)
//!        │
//!        ▼
//!  lock aggregate slot ──► token seen? ──yes──► return committed events (replayed)
//!        │                      │
//!        │                      no
//!        ▼                      ▼
//!  processor.process(cmd, state) ──Err──► Rejected (nothing stored, nothing cached)
//!        │
//!        Ok(events)
//!        ▼
//!  fold onto working copy ──► append + cache token ──► CommandOutcome
//! ```
//!
//! A command whose caller goes away before the commit leaves no trace; once
//! committed, retries are answered from the cache.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! domain/    - Aggregate, Command and CommandProcessor traits, StoredEvent
//! ports/     - EventStore trait (driving port)
//! adapters/  - InMemoryEventStore
//! error.rs   - EventStoreError
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::InMemoryEventStore;
pub use domain::{Aggregate, Command, CommandOutcome, CommandProcessor, StoredEvent};
pub use error::EventStoreError;
pub use ports::{AggregateId, EventOf, EventStore};
