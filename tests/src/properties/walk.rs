//! Random command traces over a single round.
//!
//! Actions name participants by seed; the command each one becomes depends
//! on the round state at the time it is issued, so traces mix accepted and
//! rejected commands in every phase.

use std::future::Future;

use proptest::prelude::*;
use shared_types::{AliceId, ScriptPubKey, TxOut, Uuid};
use ws_01_round::test_utils::{processor, TestAlice, TEST_ROUND_ID};
use ws_01_round::{Phase, RoundCommand, RoundEvent, RoundParameters, RoundState};
use ws_02_event_store::Aggregate;

#[derive(Clone, Debug)]
pub enum Action {
    Register(u8),
    Remove(u8),
    Confirm(u8),
    Output { script: u8, value: u64 },
    ReadyToSign(u8),
    Sign(u8),
    Advance,
    End,
}

pub fn action() -> impl Strategy<Value = Action> {
    let seed = 1u8..10;
    prop_oneof![
        6 => seed.clone().prop_map(Action::Register),
        1 => seed.clone().prop_map(Action::Remove),
        3 => seed.clone().prop_map(Action::Confirm),
        2 => (0u8..4, 5_000u64..60_000).prop_map(|(script, value)| Action::Output { script, value }),
        2 => seed.clone().prop_map(Action::ReadyToSign),
        3 => seed.prop_map(Action::Sign),
        2 => Just(Action::Advance),
        1 => Just(Action::End),
    ]
}

pub fn actions(max: usize) -> impl Strategy<Value = Vec<Action>> {
    prop::collection::vec(action(), 0..max)
}

/// Even seeds own P2TR coins, odd seeds P2WPKH.
pub fn alice(seed: u8) -> TestAlice {
    let value = 50_000 + u64::from(seed) * 10_000;
    if seed % 2 == 0 {
        TestAlice::p2tr(seed, value)
    } else {
        TestAlice::p2wpkh(seed, value)
    }
}

/// Registered alice id of `seed`, or an id the round never issued.
fn alice_id(state: &RoundState, seed: u8) -> AliceId {
    state
        .alice_by_outpoint(&alice(seed).coin.outpoint)
        .map(|(alice_id, _)| *alice_id)
        .unwrap_or_else(|| AliceId::new(Uuid::from_u128(u128::from(seed))))
}

pub fn command_for(state: &RoundState, action: &Action) -> RoundCommand {
    match action {
        Action::Register(seed) => alice(*seed).register(state),
        Action::Remove(seed) => RoundCommand::remove_input(alice_id(state, *seed)),
        Action::Confirm(seed) => alice(*seed).confirm(state, alice_id(state, *seed)),
        Action::Output { script, value } => RoundCommand::register_output(TxOut::new(
            *value,
            ScriptPubKey::new_p2wpkh([0xA0 | script; 20]),
        )),
        Action::ReadyToSign(seed) => {
            RoundCommand::notify_input_ready_to_sign(alice_id(state, *seed))
        }
        Action::Sign(seed) => {
            let alice = alice(*seed);
            RoundCommand::add_signature(alice.coin.outpoint, alice.witness())
        }
        Action::Advance => match state.phase {
            Phase::InputRegistration => RoundCommand::start_connection_confirmation(),
            Phase::ConnectionConfirmation => RoundCommand::start_output_registration(),
            Phase::OutputRegistration => RoundCommand::start_transaction_signing(),
            Phase::Signing => RoundCommand::succeed_round(),
            _ => RoundCommand::end_round(),
        },
        Action::End => RoundCommand::end_round(),
    }
}

/// Events a default round starts with.
pub fn opening_events() -> Vec<RoundEvent> {
    vec![
        RoundEvent::RoundStarted {
            parameters: RoundParameters::default(),
        },
        RoundEvent::AllInputsAllowed,
    ]
}

/// States after each accepted command, with the log that produced them.
pub struct Walk {
    pub states: Vec<RoundState>,
    /// Log length behind each entry of `states`
    pub boundaries: Vec<usize>,
    pub log: Vec<RoundEvent>,
}

impl Walk {
    pub fn last(&self) -> &RoundState {
        self.states.last().expect("walk starts from an opened round")
    }
}

/// Run `actions` through the processor, folding every accepted command.
pub fn run(actions: &[Action]) -> Walk {
    let processor = processor();
    let log = opening_events();
    let opened = RoundState::replay(TEST_ROUND_ID, &log).expect("opening events fold");
    let mut walk = Walk {
        states: vec![opened],
        boundaries: vec![log.len()],
        log,
    };

    block_on(async {
        for action in actions {
            let state = walk.last().clone();
            let command = command_for(&state, action);
            if let Ok(events) = processor.handle(&command, &state).await {
                let next = events
                    .iter()
                    .try_fold(state, |state, event| state.apply(event))
                    .expect("accepted events fold");
                walk.log.extend(events);
                walk.boundaries.push(walk.log.len());
                walk.states.push(next);
            }
        }
    });
    walk
}

pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime builds")
        .block_on(future)
}
