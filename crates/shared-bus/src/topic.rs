//! What a payload is about, and which payloads a listener wants.

use serde::{Deserialize, Serialize};
use shared_types::RoundId;

/// Payloads that can travel over the bus.
pub trait BusEvent: Clone + Send + Sync + 'static {
    fn topic(&self) -> EventTopic;

    fn round_id(&self) -> RoundId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Round start, phase changes and the end of the round
    RoundLifecycle,
    Inputs,
    Outputs,
    Signatures,
}

/// Conjunction of a topic set and a round set; an empty set matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    topics: Vec<EventTopic>,
    rounds: Vec<RoundId>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn topics(topics: impl IntoIterator<Item = EventTopic>) -> Self {
        Self::default().with_topics(topics)
    }

    pub fn round(round_id: RoundId) -> Self {
        Self::default().with_round(round_id)
    }

    #[must_use]
    pub fn with_topics(mut self, topics: impl IntoIterator<Item = EventTopic>) -> Self {
        for topic in topics {
            if !self.topics.contains(&topic) {
                self.topics.push(topic);
            }
        }
        self
    }

    #[must_use]
    pub fn with_round(mut self, round_id: RoundId) -> Self {
        if !self.rounds.contains(&round_id) {
            self.rounds.push(round_id);
        }
        self
    }

    pub fn matches<E: BusEvent>(&self, event: &E) -> bool {
        (self.topics.is_empty() || self.topics.contains(&event.topic()))
            && (self.rounds.is_empty() || self.rounds.contains(&event.round_id()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Ping {
        pub round: RoundId,
        pub topic: EventTopic,
    }

    pub(crate) fn ping(round: u8, topic: EventTopic) -> Ping {
        Ping {
            round: RoundId([round; 32]),
            topic,
        }
    }

    impl BusEvent for Ping {
        fn topic(&self) -> EventTopic {
            self.topic
        }

        fn round_id(&self) -> RoundId {
            self.round
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = EventFilter::all();
        assert!(filter.matches(&ping(1, EventTopic::Inputs)));
        assert!(filter.matches(&ping(9, EventTopic::RoundLifecycle)));
    }

    #[test]
    fn test_topic_and_round_are_both_required() {
        let filter = EventFilter::round(RoundId([7; 32])).with_topics([EventTopic::Signatures]);

        assert!(filter.matches(&ping(7, EventTopic::Signatures)));
        assert!(!filter.matches(&ping(7, EventTopic::Outputs)));
        assert!(!filter.matches(&ping(8, EventTopic::Signatures)));
    }

    #[test]
    fn test_builders_ignore_duplicates() {
        let filter = EventFilter::topics([EventTopic::Inputs, EventTopic::Inputs])
            .with_round(RoundId([1; 32]))
            .with_round(RoundId([1; 32]));
        assert_eq!(
            filter,
            EventFilter::topics([EventTopic::Inputs]).with_round(RoundId([1; 32]))
        );
    }
}
