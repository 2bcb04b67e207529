//! The full lifecycle: deploy, simulate, verify the declared commitment,
//! commit the block, then observe the stamped state.

use std::{cell::RefCell, rc::Rc};

use tessera_execution_engine::{verify_commitment, BlockContext, Error, Executor};
use tessera_state::{commit_block, AccessKind, CommitError, InMemoryGlobalState, VersionedStore};
use tessera_types::{Address, Args, BlockEffects, Version};

const OWNER: Address = Address::new([0xaa; 20]);
const SENDER: Address = Address::new([0xbb; 20]);

const COUNTER_WAT: &str = r#"
(module
  (import "env" "__read_state" (func $read_state (param i32 i32 i32 i32 i32) (result i32)))
  (import "env" "__write_state" (func $write_state (param i32 i32 i32 i32) (result i32)))
  (import "env" "__set_response" (func $set_response (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "count")
  (func (export "bump") (result i32)
    (local $n i32)
    ;; read the current count into 16; a missing key starts at zero
    (local.set $n
      (call $read_state (i32.const 0) (i32.const 5) (i32.const 0) (i32.const 16) (i32.const 1)))
    (if (i32.eq (local.get $n) (i32.const -1))
      (then (return (i32.const -1))))
    (if (i32.eq (local.get $n) (i32.const -2))
      (then (i32.store8 (i32.const 16) (i32.const 0))))
    (i32.store8 (i32.const 16) (i32.add (i32.load8_u (i32.const 16)) (i32.const 1)))
    (drop (call $write_state (i32.const 0) (i32.const 5) (i32.const 16) (i32.const 1)))
    (drop (call $set_response (i32.const 16) (i32.const 1)))
    (i32.const 0)))
"#;

fn executor() -> Executor<InMemoryGlobalState> {
    Executor::new(Rc::new(RefCell::new(InMemoryGlobalState::new())))
}

#[test]
fn simulate_verify_commit_and_observe() {
    let executor = executor();
    let code = wat::parse_str(COUNTER_WAT).unwrap();
    let address = executor.deploy_contract(OWNER, code).unwrap();

    // Simulation: run the transaction and capture its effects.
    let block = BlockContext::new(5, 0);
    let outcome = executor
        .environment(block, SENDER, address, Args::new())
        .unwrap()
        .exec("bump")
        .unwrap();
    assert_eq!(outcome.response, vec![1]);
    let declared = outcome.effects.commitment();

    // Consensus: the declared commitment matches a fresh execution.
    verify_commitment(declared, &outcome.effects).unwrap();
    assert!(matches!(
        verify_commitment(BlockEffects::new().commitment(), &outcome.effects),
        Err(Error::CommitmentMismatch { .. })
    ));

    // Commit: writes land stamped with the block version.
    commit_block(
        &mut *executor.state().borrow_mut(),
        &outcome.effects,
        block.version(),
    )
    .unwrap();

    let store = VersionedStore::new(Rc::clone(executor.state()), address);
    let stored = store.get(b"count").unwrap();
    assert_eq!(stored.value, vec![1]);
    assert_eq!(stored.version, Version::new(5, 0));

    // The next block reads the committed value and bumps it again.
    let block = BlockContext::new(6, 0);
    let outcome = executor
        .environment(block, SENDER, address, Args::new())
        .unwrap()
        .exec("bump")
        .unwrap();
    assert_eq!(outcome.response, vec![2]);

    let effect = outcome.effects.iter().next().unwrap();
    assert_eq!(effect.effect_set.read_records[0].version, Version::new(5, 0));

    commit_block(
        &mut *executor.state().borrow_mut(),
        &outcome.effects,
        block.version(),
    )
    .unwrap();
    assert_eq!(store.get(b"count").unwrap().value, vec![2]);
}

#[test]
fn stale_simulations_are_rejected_at_commit() {
    let executor = executor();
    let code = wat::parse_str(COUNTER_WAT).unwrap();
    let address = executor.deploy_contract(OWNER, code).unwrap();

    // Establish a committed counter so later reads carry a dependency.
    let genesis = BlockContext::new(1, 0);
    let seeded = executor
        .environment(genesis, SENDER, address, Args::new())
        .unwrap()
        .exec("bump")
        .unwrap();
    commit_block(
        &mut *executor.state().borrow_mut(),
        &seeded.effects,
        genesis.version(),
    )
    .unwrap();

    // Two transactions simulated against the same pre-block state.
    let block = BlockContext::new(2, 0);
    let first = executor
        .environment(block, SENDER, address, Args::new())
        .unwrap()
        .exec("bump")
        .unwrap();
    let second = executor
        .environment(BlockContext::new(2, 1), SENDER, address, Args::new())
        .unwrap()
        .exec("bump")
        .unwrap();
    assert_eq!(first.response, second.response);

    // Sequenced into one block, the second transaction's read of `count` is
    // stale: the first transaction wrote it.
    let mut combined = first.effects.clone();
    combined.append(second.effects);
    let error = commit_block(
        &mut *executor.state().borrow_mut(),
        &combined,
        block.version(),
    )
    .unwrap_err();
    assert_eq!(
        error,
        CommitError::Conflict {
            address,
            key: b"count".to_vec(),
            access: AccessKind::Read,
        }
    );

    // The rejected block left the committed state untouched.
    let store = VersionedStore::new(Rc::clone(executor.state()), address);
    let stored = store.get(b"count").unwrap();
    assert_eq!(stored.value, vec![1]);
    assert_eq!(stored.version, Version::new(1, 0));
}
