//! # Replay Properties
//!
//! 1. Folding any committed prefix of a round's log from empty gives the
//!    state reached step by step
//! 2. A command issued twice under one token commits once; the retry sees
//!    exactly what the first attempt saw

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use ws_01_round::test_utils::{processor, TEST_ROUND_ID};
    use ws_01_round::{RoundCommand, RoundParameters, RoundState};
    use ws_02_event_store::{Aggregate, EventStore, InMemoryEventStore};

    use crate::properties::walk::{self, actions};

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]

        #[test]
        fn replay_matches_incremental_fold(trace in actions(40)) {
            let walk = walk::run(&trace);
            let replayed = RoundState::replay(TEST_ROUND_ID, &walk.log).unwrap();
            prop_assert_eq!(&replayed, walk.last());

            for (state, &len) in walk.states.iter().zip(&walk.boundaries) {
                let prefix = RoundState::replay(TEST_ROUND_ID, &walk.log[..len]).unwrap();
                prop_assert_eq!(&prefix, state);
            }
        }

        #[test]
        fn retries_commit_once(trace in actions(24)) {
            walk::block_on(async {
                let store = InMemoryEventStore::new(Arc::new(processor()));
                store
                    .process_command(
                        RoundCommand::start_round(RoundParameters::default(), None),
                        &TEST_ROUND_ID,
                    )
                    .await
                    .unwrap();

                for action in &trace {
                    let state = store.load(&TEST_ROUND_ID).await;
                    let command = walk::command_for(&state, action);
                    let first = store.process_command(command.clone(), &TEST_ROUND_ID).await;
                    let log_len = store.events(&TEST_ROUND_ID).await.len();
                    let second = store.process_command(command, &TEST_ROUND_ID).await;

                    prop_assert_eq!(store.events(&TEST_ROUND_ID).await.len(), log_len);
                    match (first, second) {
                        (Ok(first), Ok(second)) => {
                            prop_assert!(second.replayed);
                            prop_assert_eq!(first.new_events, second.new_events);
                        }
                        (Err(first), Err(second)) => {
                            prop_assert_eq!(first.rejection(), second.rejection());
                        }
                        (first, second) => {
                            prop_assert!(false, "retry diverged: {:?} then {:?}", first, second);
                        }
                    }
                }

                let rebuilt = store.rebuild(&TEST_ROUND_ID).await.unwrap();
                prop_assert_eq!(rebuilt, store.load(&TEST_ROUND_ID).await);
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
