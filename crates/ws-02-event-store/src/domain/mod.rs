//! Domain layer for the event store.

pub mod aggregate;
pub mod stored;

pub use aggregate::{Aggregate, Command, CommandProcessor};
pub use stored::{CommandOutcome, StoredEvent};
