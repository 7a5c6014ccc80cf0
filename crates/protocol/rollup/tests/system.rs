//! End-to-end scenarios driving a fully wired deployment.

use alloy_primitives::{Address, B256, Bytes, U256, address, keccak256};
use arbor_outbox::{
    L2ToL1Send, OutboxError,
    merkle::{calculate_merkle_root, generate_proof},
};
use arbor_primitives::{CallContext, CoreConfig, MessageKind, MockDispatcher, encoding};
use arbor_rollup::{
    Assertion, ChallengeArgs, ChallengeFactory, ChallengeParticipant, ConfirmArgs, CoreSystem,
    ExecutionState, NewNodeArgs, NodeNum, NodeStatus, RollupError, RollupEvent, Wiring,
    feed_send_accumulator, node_hash,
};
use arbor_sequencer::{BatchSubmission, ForcedMessage, add_sequencer_item, item_prefix_hash};

const OWNER: Address = address!("0x00000000000000000000000000000000000000a0");
const SEQUENCER: Address = address!("0x00000000000000000000000000000000000000a1");
const STAKER_A: Address = address!("0x00000000000000000000000000000000000000a2");
const STAKER_B: Address = address!("0x00000000000000000000000000000000000000a3");
const STAKER_C: Address = address!("0x00000000000000000000000000000000000000a4");
const L2_USER: Address = address!("0x00000000000000000000000000000000000000a5");
const DEST: Address = address!("0x00000000000000000000000000000000000000a6");
const CHALLENGE: Address = address!("0xca000000000000000000000000000000000000ff");

const CONFIRM_PERIOD: u64 = 100;
const EXTRA_CHALLENGE_TIME: u64 = 20;

fn base_stake() -> U256 {
    U256::from(10).pow(U256::from(18))
}

fn config() -> CoreConfig {
    CoreConfig {
        confirm_period_blocks: CONFIRM_PERIOD,
        extra_challenge_time_blocks: EXTRA_CHALLENGE_TIME,
        base_stake: base_stake(),
        stake_token: None,
        owner: OWNER,
        sequencer: SEQUENCER,
        max_delay_blocks: 100,
        max_delay_seconds: 1_000,
        genesis_machine_hash: keccak256(b"genesis machine"),
    }
}

fn wiring() -> Wiring {
    Wiring {
        rollup: Address::with_last_byte(0x11),
        bridge: Address::with_last_byte(0x12),
        inbox: Address::with_last_byte(0x13),
        sequencer_inbox: Address::with_last_byte(0x14),
        outbox: Address::with_last_byte(0x15),
        event_bridge: Address::with_last_byte(0x16),
    }
}

/// Stands in for the external bisection game; always mints [`CHALLENGE`].
#[derive(Debug)]
struct FixedChallengeFactory;

impl ChallengeFactory for FixedChallengeFactory {
    fn create_challenge(
        &mut self,
        _asserter: &ChallengeParticipant,
        _challenger: &ChallengeParticipant,
        _challenged_node: NodeNum,
    ) -> Address {
        CHALLENGE
    }
}

fn deploy() -> CoreSystem {
    CoreSystem::new(
        config(),
        wiring(),
        Box::new(FixedChallengeFactory),
        &CallContext::new(OWNER, 1, 1_000),
    )
    .unwrap()
}

/// Seals one single-transaction sequencer batch and returns its accumulator.
fn seal_batch(system: &mut CoreSystem) -> B256 {
    let ctx = CallContext::new(SEQUENCER, 5, 5_000);
    let prefix = item_prefix_hash(SEQUENCER, 5, 5_000);
    let after_acc = add_sequencer_item(B256::ZERO, 0, prefix, b"user tx");
    let submission = BatchSubmission {
        transactions: Bytes::from_static(b"user tx"),
        lengths: vec![7],
        l1_block_number: 5,
        timestamp: 5_000,
        total_delayed_messages_read: 0,
        after_acc,
    };
    assert_eq!(system.add_sequencer_l2_batch(&ctx, &submission), Ok(0));
    after_acc
}

fn withdrawal(tag: u8) -> L2ToL1Send {
    L2ToL1Send {
        l2_sender: L2_USER,
        dest: DEST,
        l2_block: 900 + tag as u64,
        l1_block: 5,
        l2_timestamp: 9_000 + tag as u64,
        amount: U256::from(tag),
        calldata: Bytes::copy_from_slice(&[tag; 3]),
    }
}

/// The canonical dispute: A asserts, B rivals, B loses the challenge, A's
/// node confirms and seeds the outbox, B's node is rejected, and the
/// withdrawal proven into A's assertion redeems exactly once per leaf.
#[test]
fn dispute_confirmation_and_redemption() {
    let mut system = deploy();
    let batch_acc = seal_batch(&mut system);

    let sends = [withdrawal(1), withdrawal(2)];
    let send_bytes: Vec<Vec<u8>> = sends.iter().map(L2ToL1Send::to_bytes).collect();
    let mut send_acc = B256::ZERO;
    for bytes in &send_bytes {
        send_acc = feed_send_accumulator(send_acc, bytes);
    }

    let genesis_state = ExecutionState::genesis(config().genesis_machine_hash);
    let genesis_hash = system.rollup.node(0).unwrap().node_hash;

    // Staker A asserts the honest outcome off genesis.
    let assertion_a = Assertion {
        before_state: genesis_state,
        after_state: ExecutionState {
            machine_hash: keccak256(b"machine a"),
            inbox_count: 1,
            send_count: 2,
            log_count: 0,
            send_acc,
            log_acc: B256::ZERO,
        },
    };
    system
        .new_stake(&CallContext::new(STAKER_A, 10, 10_000).with_value(base_stake()))
        .unwrap();
    let node_a = system
        .stake_on_new_node(&CallContext::new(STAKER_A, 11, 11_000), &NewNodeArgs {
            expected_node_hash: node_hash(
                false,
                genesis_hash,
                assertion_a.execution_hash(),
                batch_acc,
            ),
            assertion: assertion_a,
            prev_node_num: 0,
            batch_index: 0,
        })
        .unwrap();
    assert_eq!(node_a, 1);
    assert_eq!(system.rollup.node(node_a).unwrap().deadline_block, 11 + CONFIRM_PERIOD);

    // Staker B rivals it with a conflicting assertion.
    let assertion_b = Assertion {
        before_state: genesis_state,
        after_state: ExecutionState {
            machine_hash: keccak256(b"machine b"),
            inbox_count: 1,
            send_count: 0,
            log_count: 0,
            send_acc: B256::ZERO,
            log_acc: B256::ZERO,
        },
    };
    system
        .new_stake(&CallContext::new(STAKER_B, 12, 12_000).with_value(base_stake()))
        .unwrap();
    let node_b = system
        .stake_on_new_node(&CallContext::new(STAKER_B, 13, 13_000), &NewNodeArgs {
            expected_node_hash: node_hash(
                true,
                system.rollup.node(node_a).unwrap().node_hash,
                assertion_b.execution_hash(),
                batch_acc,
            ),
            assertion: assertion_b,
            prev_node_num: 0,
            batch_index: 0,
        })
        .unwrap();
    assert_eq!(node_b, 2);
    // The rival gets the extra challenge window on top of the parent chain.
    assert_eq!(
        system.rollup.node(node_b).unwrap().deadline_block,
        13 + CONFIRM_PERIOD + EXTRA_CHALLENGE_TIME
    );

    let confirm_args = ConfirmArgs {
        before_send_acc: B256::ZERO,
        sends_data: send_bytes.concat().into(),
        send_lengths: send_bytes.iter().map(|bytes| bytes.len() as u64).collect(),
        after_send_count: 2,
        after_log_acc: B256::ZERO,
        after_log_count: 0,
    };

    // The deadline gate holds while the dispute is young.
    assert_eq!(
        system.confirm_next_node(&CallContext::new(STAKER_A, 50, 50_000), &confirm_args),
        Err(RollupError::DeadlineNotPassed { deadline: 111, current: 50 })
    );

    // The conflict goes to a challenge, which A wins.
    let challenge = system
        .create_challenge(&CallContext::new(STAKER_A, 60, 60_000), &ChallengeArgs {
            stakers: [STAKER_A, STAKER_B],
            node_nums: [node_a, node_b],
            execution_hashes: [assertion_a.execution_hash(), assertion_b.execution_hash()],
            proposed_blocks: [11, 13],
            max_message_counts: [1, 1],
        })
        .unwrap();
    assert_eq!(challenge, CHALLENGE);
    assert!(matches!(
        system.rollup.events().last(),
        Some(RollupEvent::RollupChallengeStarted { challenged_node: 1, .. })
    ));

    // Only the challenge instance may deliver the verdict.
    assert_eq!(
        system.complete_challenge(&CallContext::new(STAKER_A, 61, 61_000), STAKER_A, STAKER_B),
        Err(RollupError::OnlyChallenge { expected: CHALLENGE, caller: STAKER_A })
    );
    system
        .complete_challenge(&CallContext::new(CHALLENGE, 62, 62_000), STAKER_A, STAKER_B)
        .unwrap();

    // B is now a zombie; half its stake went to A, half to the owner.
    assert!(!system.rollup.core().is_staked(STAKER_B));
    assert_eq!(system.rollup.core().zombie_count(), 1);
    assert_eq!(
        system.rollup.core().staker(STAKER_A).unwrap().amount_staked,
        base_stake() + base_stake() / U256::from(2)
    );
    assert_eq!(
        system.rollup.core().withdrawable_funds(OWNER),
        base_stake() - base_stake() / U256::from(2)
    );

    // Walk the zombie's markings off the losing branch.
    system.remove_zombie(0, 10).unwrap();
    assert_eq!(system.rollup.core().zombie_count(), 0);
    assert!(!system.rollup.node(node_b).unwrap().has_staker(STAKER_B));

    // Past the deadline with no rival stake left, A's node confirms and
    // seeds the outbox.
    system.confirm_next_node(&CallContext::new(STAKER_A, 112, 112_000), &confirm_args).unwrap();
    assert_eq!(system.rollup.latest_confirmed(), node_a);
    assert_eq!(system.rollup.node(node_a).unwrap().status, NodeStatus::Confirmed);

    let leaves: Vec<B256> = send_bytes.iter().map(keccak256).collect();
    let entry = system.outbox.entry(0).unwrap();
    assert_eq!(entry.num_remaining(), 2);
    let proof = generate_proof(&leaves, 0).unwrap();
    assert_eq!(entry.root(), calculate_merkle_root(&proof, 0, leaves[0]).unwrap());

    // The beaten rival is next in line and is rejected outright: its parent
    // already lost to a confirmed sibling.
    system.reject_next_node(&CallContext::new(STAKER_A, 113, 113_000), STAKER_A).unwrap();
    assert_eq!(system.rollup.node(node_b).unwrap().status, NodeStatus::Rejected);
    assert_eq!(
        system.confirm_next_node(&CallContext::new(STAKER_A, 114, 114_000), &confirm_args),
        Err(RollupError::NoUnresolvedNode)
    );

    // Each leaf redeems exactly once; the second attempt on a spent leaf
    // names the double-spend.
    let mut dispatcher = MockDispatcher::new();
    let redeem_ctx = CallContext::new(L2_USER, 120, 120_000);
    let outcome = system
        .execute_transaction(&redeem_ctx, &mut dispatcher, 0, &proof, 0, &sends[0])
        .unwrap();
    assert!(outcome.success);
    assert_eq!(dispatcher.calls.len(), 1);
    assert_eq!(dispatcher.calls[0].dest, DEST);
    assert_eq!(dispatcher.calls[0].value, U256::from(1));
    assert_eq!(system.outbox.entry(0).unwrap().num_remaining(), 1);

    assert_eq!(
        system.execute_transaction(&redeem_ctx, &mut dispatcher, 0, &proof, 0, &sends[0]),
        Err(OutboxError::AlreadySpent(0))
    );

    // Redeeming the last leaf exhausts and destroys the entry.
    let proof = generate_proof(&leaves, 1).unwrap();
    system.execute_transaction(&redeem_ctx, &mut dispatcher, 0, &proof, 1, &sends[1]).unwrap();
    assert!(system.outbox.entry(0).is_none());

    // A's stake is returnable now that it backs only confirmed history.
    system.return_old_deposit(&CallContext::new(STAKER_A, 121, 121_000)).unwrap();
    let withdrawn =
        system.withdraw_staker_funds(&CallContext::new(STAKER_A, 122, 122_000)).unwrap();
    assert_eq!(withdrawn, base_stake() + base_stake() / U256::from(2));

    // The lifecycle relay mirrored every transition, in order.
    let tags: Vec<u8> = system.event_bridge.relayed().iter().map(|data| data[0]).collect();
    assert_eq!(tags, vec![0, 4, 1, 4, 1, 5, 2, 3]);
}

/// An idle staker that never takes a position blocks confirmation until it
/// moves onto the node.
#[test]
fn idle_staker_blocks_confirmation() {
    let mut system = deploy();
    let batch_acc = seal_batch(&mut system);

    let genesis_state = ExecutionState::genesis(config().genesis_machine_hash);
    let genesis_hash = system.rollup.node(0).unwrap().node_hash;
    let assertion = Assertion {
        before_state: genesis_state,
        after_state: ExecutionState {
            machine_hash: keccak256(b"machine"),
            inbox_count: 1,
            send_count: 0,
            log_count: 0,
            send_acc: B256::ZERO,
            log_acc: B256::ZERO,
        },
    };

    system
        .new_stake(&CallContext::new(STAKER_A, 10, 10_000).with_value(base_stake()))
        .unwrap();
    let node = system
        .stake_on_new_node(&CallContext::new(STAKER_A, 11, 11_000), &NewNodeArgs {
            expected_node_hash: node_hash(
                false,
                genesis_hash,
                assertion.execution_hash(),
                batch_acc,
            ),
            assertion,
            prev_node_num: 0,
            batch_index: 0,
        })
        .unwrap();
    system
        .new_stake(&CallContext::new(STAKER_C, 12, 12_000).with_value(base_stake()))
        .unwrap();

    let confirm_args = ConfirmArgs {
        before_send_acc: B256::ZERO,
        sends_data: Bytes::new(),
        send_lengths: vec![],
        after_send_count: 0,
        after_log_acc: B256::ZERO,
        after_log_count: 0,
    };
    assert_eq!(
        system.confirm_next_node(&CallContext::new(STAKER_A, 200, 200_000), &confirm_args),
        Err(RollupError::NotAllStaked { on_node: 1, expected: 2 })
    );

    let node_hash_value = system.rollup.node(node).unwrap().node_hash;
    system
        .stake_on_existing_node(&CallContext::new(STAKER_C, 201, 201_000), node, node_hash_value)
        .unwrap();
    system.confirm_next_node(&CallContext::new(STAKER_A, 202, 202_000), &confirm_args).unwrap();
    assert_eq!(system.rollup.latest_confirmed(), node);
    // An assertion with no sends seeds no outbox entry.
    assert_eq!(system.outbox.entries_len(), 0);
}

/// Bad assertions are refused with the precondition that failed.
#[test]
fn assertion_preconditions_are_distinct() {
    let mut system = deploy();
    let batch_acc = seal_batch(&mut system);

    let genesis_state = ExecutionState::genesis(config().genesis_machine_hash);
    let genesis_hash = system.rollup.node(0).unwrap().node_hash;
    let assertion = Assertion {
        before_state: genesis_state,
        after_state: ExecutionState {
            machine_hash: keccak256(b"machine"),
            inbox_count: 1,
            send_count: 0,
            log_count: 0,
            send_acc: B256::ZERO,
            log_acc: B256::ZERO,
        },
    };
    let good_args = NewNodeArgs {
        expected_node_hash: node_hash(false, genesis_hash, assertion.execution_hash(), batch_acc),
        assertion,
        prev_node_num: 0,
        batch_index: 0,
    };

    // Staking twice is refused outright.
    let stake_ctx = CallContext::new(STAKER_A, 10, 10_000).with_value(base_stake());
    system.new_stake(&stake_ctx).unwrap();
    assert_eq!(system.new_stake(&stake_ctx), Err(RollupError::AlreadyStaked(STAKER_A)));

    // Underfunded stakes are refused with the requirement.
    assert_eq!(
        system.new_stake(&CallContext::new(STAKER_B, 10, 10_000).with_value(U256::from(1))),
        Err(RollupError::InsufficientStake { required: base_stake(), provided: U256::from(1) })
    );

    let ctx = CallContext::new(STAKER_A, 11, 11_000);

    // An assertion reading past what the sequencer accepted is stale.
    let mut overread = good_args.clone();
    overread.assertion.after_state.inbox_count = 5;
    assert!(matches!(
        system.stake_on_new_node(&ctx, &overread),
        Err(RollupError::BatchProof(_))
    ));

    // A before state that does not extend the parent is refused.
    let mut detached = good_args.clone();
    detached.assertion.before_state.machine_hash = keccak256(b"elsewhere");
    assert!(matches!(
        system.stake_on_new_node(&ctx, &detached),
        Err(RollupError::PreviousStateMismatch { .. })
    ));

    // A mispredicted node hash is refused before any state changes.
    let mut mispredicted = good_args.clone();
    mispredicted.expected_node_hash = keccak256(b"wrong");
    assert!(matches!(
        system.stake_on_new_node(&ctx, &mispredicted),
        Err(RollupError::NodeHashMismatch { .. })
    ));

    system.stake_on_new_node(&ctx, &good_args).unwrap();
    assert_eq!(system.rollup.core().latest_node_created(), 1);
}

/// When the older sibling loses the challenge, rejecting it takes the full
/// witness path: a staker on a competing unresolved branch, a passed
/// deadline, and no live backer left.
#[test]
fn losing_first_node_is_rejected_with_witness() {
    let mut system = deploy();
    let batch_acc = seal_batch(&mut system);

    let genesis_state = ExecutionState::genesis(config().genesis_machine_hash);
    let genesis_hash = system.rollup.node(0).unwrap().node_hash;

    let assertion_a = Assertion {
        before_state: genesis_state,
        after_state: ExecutionState {
            machine_hash: keccak256(b"machine a"),
            inbox_count: 1,
            send_count: 0,
            log_count: 0,
            send_acc: B256::ZERO,
            log_acc: B256::ZERO,
        },
    };
    let assertion_b = Assertion {
        before_state: genesis_state,
        after_state: ExecutionState {
            machine_hash: keccak256(b"machine b"),
            inbox_count: 1,
            send_count: 0,
            log_count: 0,
            send_acc: B256::ZERO,
            log_acc: B256::ZERO,
        },
    };

    system
        .new_stake(&CallContext::new(STAKER_A, 10, 10_000).with_value(base_stake()))
        .unwrap();
    let node_a = system
        .stake_on_new_node(&CallContext::new(STAKER_A, 11, 11_000), &NewNodeArgs {
            expected_node_hash: node_hash(
                false,
                genesis_hash,
                assertion_a.execution_hash(),
                batch_acc,
            ),
            assertion: assertion_a,
            prev_node_num: 0,
            batch_index: 0,
        })
        .unwrap();
    system
        .new_stake(&CallContext::new(STAKER_B, 12, 12_000).with_value(base_stake()))
        .unwrap();
    let node_b = system
        .stake_on_new_node(&CallContext::new(STAKER_B, 13, 13_000), &NewNodeArgs {
            expected_node_hash: node_hash(
                true,
                system.rollup.node(node_a).unwrap().node_hash,
                assertion_b.execution_hash(),
                batch_acc,
            ),
            assertion: assertion_b,
            prev_node_num: 0,
            batch_index: 0,
        })
        .unwrap();

    system
        .create_challenge(&CallContext::new(STAKER_B, 20, 20_000), &ChallengeArgs {
            stakers: [STAKER_A, STAKER_B],
            node_nums: [node_a, node_b],
            execution_hashes: [assertion_a.execution_hash(), assertion_b.execution_hash()],
            proposed_blocks: [11, 13],
            max_message_counts: [1, 1],
        })
        .unwrap();
    // This time the challenger wins.
    system
        .complete_challenge(&CallContext::new(CHALLENGE, 21, 21_000), STAKER_B, STAKER_A)
        .unwrap();

    // The witness must hold a live stake; the beaten asserter is a zombie.
    assert_eq!(
        system.reject_next_node(&CallContext::new(STAKER_B, 112, 112_000), STAKER_A),
        Err(RollupError::NotStaked(STAKER_A))
    );
    // The zombie's marking still sits on the losing node, but zombie weight
    // does not keep a node alive.
    assert!(system.rollup.node(node_a).unwrap().has_staker(STAKER_A));
    system.reject_next_node(&CallContext::new(STAKER_B, 112, 112_000), STAKER_B).unwrap();
    assert_eq!(system.rollup.node(node_a).unwrap().status, NodeStatus::Rejected);
    assert_eq!(system.rollup.first_unresolved_node(), node_b);

    // The surviving sibling confirms once its own deadline passes.
    let confirm_args = ConfirmArgs {
        before_send_acc: B256::ZERO,
        sends_data: Bytes::new(),
        send_lengths: vec![],
        after_send_count: 0,
        after_log_acc: B256::ZERO,
        after_log_count: 0,
    };
    system.confirm_next_node(&CallContext::new(STAKER_B, 200, 200_000), &confirm_args).unwrap();
    assert_eq!(system.rollup.latest_confirmed(), node_b);
}

/// A deposit routed through the delayed inbox can be forced into the
/// sequencer's accumulator once it ages past the delay bound.
#[test]
fn delayed_deposit_can_be_forced_after_the_window() {
    let mut system = deploy();

    let deposit_ctx =
        CallContext::new(L2_USER, 50, 50_000).with_value(U256::from(7_000));
    let message_num = system.deposit_eth(&deposit_ctx, DEST).unwrap();
    // The initialization relay occupies index 0.
    assert_eq!(message_num, 1);

    let mut payload = Vec::new();
    payload.extend_from_slice(DEST.as_slice());
    payload.extend_from_slice(&encoding::u256_word(U256::from(7_000)));
    let forced = ForcedMessage {
        kind: MessageKind::EthDeposit,
        sender: L2_USER,
        l1_block_and_timestamp: [50, 50_000],
        inbox_seq_num: 1,
        gas_price_l1: U256::ZERO,
        data_hash: keccak256(&payload),
    };

    assert!(
        system
            .force_inclusion(&CallContext::new(STAKER_A, 100, 100_000), 2, &forced)
            .is_err()
    );
    system
        .force_inclusion(&CallContext::new(STAKER_A, 151, 51_001), 2, &forced)
        .unwrap();
    assert_eq!(system.sequencer_inbox.total_delayed_messages_read(), 2);
    assert_eq!(system.sequencer_inbox.message_count(), 2);
}
