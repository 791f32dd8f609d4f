//! # Quota Properties
//!
//! 1. Remaining allocations plus what registered inputs hold always add up
//!    to the round's initial allocations
//! 2. Every registration commits the full per-alice vsize allocation, so the
//!    vsize handed out as inputs plus credentials never exceeds the round's
//! 3. Registrations fit the vsize allocation exactly: a commitment equal to
//!    what remains succeeds, one unit more fails

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use ws_01_round::test_utils::{processor, started_round, TestAlice};
    use ws_01_round::{RoundCommandProcessor, RoundError, RoundParameters, RoundState};
    use ws_02_event_store::Aggregate;

    use crate::properties::walk::{self, actions};

    /// Register each alice in turn, folding accepted registrations.
    fn register_all(
        processor: &RoundCommandProcessor,
        state: RoundState,
        alices: &[TestAlice],
    ) -> (RoundState, Vec<Result<(), Vec<RoundError>>>) {
        walk::block_on(async {
            let mut state = state;
            let mut results = Vec::new();
            for alice in alices {
                match processor.handle(&alice.register(&state), &state).await {
                    Ok(events) => {
                        state = events
                            .iter()
                            .try_fold(state, |state, event| state.apply(event))
                            .unwrap();
                        results.push(Ok(()));
                    }
                    Err(errors) => results.push(Err(errors)),
                }
            }
            (state, results)
        })
    }

    fn round_with_vsize_allocation(allocation: u64) -> RoundState {
        let mut state = started_round(None);
        state.remaining_vsize_allocation = allocation;
        state
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]

        #[test]
        fn allocations_are_conserved(trace in actions(40)) {
            let params = RoundParameters::default();
            let walk = walk::run(&trace);

            for state in &walk.states {
                let held_vsize = state.inputs.len() as u64 * params.max_vsize_allocation_per_alice;
                let issued_vsize: u64 = state
                    .inputs
                    .values()
                    .map(|input| input.coin.input_vsize().unwrap() + input.vsize_credential_value)
                    .sum();
                let held_amount: u64 = state.inputs.values().map(|input| input.coin.amount()).sum();

                prop_assert!(issued_vsize <= held_vsize);
                prop_assert_eq!(
                    state.remaining_vsize_allocation + held_vsize,
                    params.initial_input_vsize_allocation
                );
                prop_assert_eq!(
                    state.remaining_amount_allocation + held_amount,
                    params.max_total_input_amount
                );
            }
        }

        #[test]
        fn vsize_allocation_is_never_overdrawn(
            taproot in prop::collection::vec(any::<bool>(), 1..8),
            allocation in 0u64..2_000,
        ) {
            let alices: Vec<TestAlice> = taproot
                .iter()
                .enumerate()
                .map(|(i, &p2tr)| {
                    let seed = i as u8 + 1;
                    if p2tr {
                        TestAlice::p2tr(seed, 100_000)
                    } else {
                        TestAlice::p2wpkh(seed, 100_000)
                    }
                })
                .collect();

            let (state, results) =
                register_all(&processor(), round_with_vsize_allocation(allocation), &alices);

            let per_alice = RoundParameters::default().max_vsize_allocation_per_alice;
            let mut remaining = allocation;
            for result in results {
                if per_alice <= remaining {
                    prop_assert!(result.is_ok());
                    remaining -= per_alice;
                } else {
                    prop_assert_eq!(
                        result,
                        Err(vec![RoundError::VsizeQuotaExceeded {
                            requested: per_alice,
                            remaining,
                        }])
                    );
                }
            }
            prop_assert_eq!(state.remaining_vsize_allocation, remaining);
        }

        #[test]
        fn exact_allocation_is_usable(count in 1u64..6) {
            let alices: Vec<TestAlice> = (1..=count)
                .map(|seed| TestAlice::p2wpkh(seed as u8, 100_000))
                .collect();
            let per_alice = RoundParameters::default().max_vsize_allocation_per_alice;

            let (exact, results) =
                register_all(&processor(), round_with_vsize_allocation(count * per_alice), &alices);
            prop_assert!(results.iter().all(Result::is_ok));
            prop_assert_eq!(exact.remaining_vsize_allocation, 0);
            prop_assert_eq!(exact.inputs.len() as u64, count);

            let (short, results) = register_all(
                &processor(),
                round_with_vsize_allocation(count * per_alice - 1),
                &alices,
            );
            prop_assert_eq!(short.inputs.len() as u64, count - 1);
            prop_assert_eq!(
                results.last().cloned(),
                Some(Err(vec![RoundError::VsizeQuotaExceeded {
                    requested: per_alice,
                    remaining: per_alice - 1,
                }]))
            );
        }
    }
}
