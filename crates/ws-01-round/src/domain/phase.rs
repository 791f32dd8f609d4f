//! Round phases and the transition graph between them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a round.
///
/// ```text
/// New → InputRegistration → ConnectionConfirmation → OutputRegistration → Signing → Succeeded → Ended
///              │                     │                       │               │
///              └─────────────────────┴───────────────────────┴───────────────┴──────────────→ Ended
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Phase {
    /// No events yet.
    #[default]
    New,
    InputRegistration,
    ConnectionConfirmation,
    OutputRegistration,
    Signing,
    Succeeded,
    /// Terminal.
    Ended,
}

impl Phase {
    /// Phase reached by the forward advance from this one.
    pub fn successor(self) -> Option<Phase> {
        match self {
            Phase::New => Some(Phase::InputRegistration),
            Phase::InputRegistration => Some(Phase::ConnectionConfirmation),
            Phase::ConnectionConfirmation => Some(Phase::OutputRegistration),
            Phase::OutputRegistration => Some(Phase::Signing),
            Phase::Signing => Some(Phase::Succeeded),
            Phase::Succeeded => Some(Phase::Ended),
            Phase::Ended => None,
        }
    }

    /// Whether the graph has an edge from `self` to `next`.
    pub fn can_transition_to(self, next: Phase) -> bool {
        self.successor() == Some(next) || (next == Phase::Ended && self != Phase::Ended)
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Ended
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::New => "New",
            Phase::InputRegistration => "InputRegistration",
            Phase::ConnectionConfirmation => "ConnectionConfirmation",
            Phase::OutputRegistration => "OutputRegistration",
            Phase::Signing => "Signing",
            Phase::Succeeded => "Succeeded",
            Phase::Ended => "Ended",
        };
        f.write_str(name)
    }
}
