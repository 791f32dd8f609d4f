//! Default implementations of the outbound ports.

pub mod clock;
pub mod id_generator;
pub mod utxo_set;

pub use clock::SystemTimeSource;
pub use id_generator::RandomIdGenerator;
pub use utxo_set::InMemoryUtxoSet;
