//! Participant secrets from the operating system's CSPRNG.

use crate::ports::UnguessableIdGenerator;
use uuid::Uuid;

/// Version 4 UUIDs; `uuid` draws them from `getrandom`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdGenerator;

impl UnguessableIdGenerator for RandomIdGenerator {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
