//! Integration tests for Store action broadcasting
//!
//! Tests the action observation features that let callers wait for the
//! terminal action of a multi-step workflow and stream progress actions
//! to observers.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
#![allow(clippy::needless_continue)] // Test code - allow pedantic warnings

use event360_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use event360_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
#[allow(dead_code)]
enum WorkflowAction {
    /// Kick off a three-stage workflow with a correlation ID
    Begin { id: u64 },
    /// A workflow stage finished
    StageDone { id: u64, stage: u32 },
    /// Workflow finished (terminal action)
    Finished { id: u64 },
    /// Workflow aborted (terminal action)
    Aborted { id: u64, reason: String },
    /// Simple one-shot command
    Ping,
    /// Response to the one-shot command
    Pong { value: u32 },
}

#[derive(Debug, Clone, Default)]
struct WorkflowState {
    pings: u32,
    stages_seen: Vec<u32>,
}

#[derive(Clone)]
struct WorkflowEnv;

#[derive(Clone)]
struct WorkflowReducer;

impl Reducer for WorkflowReducer {
    type State = WorkflowState;
    type Action = WorkflowAction;
    type Environment = WorkflowEnv;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            WorkflowAction::Begin { id } => {
                state.stages_seen.clear();
                smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Some(WorkflowAction::StageDone { id, stage: 1 })
                }))]
            }

            WorkflowAction::StageDone { id, stage } => {
                state.stages_seen.push(stage);

                if stage < 3 {
                    smallvec![Effect::Future(Box::pin(async move {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Some(WorkflowAction::StageDone { id, stage: stage + 1 })
                    }))]
                } else {
                    smallvec![Effect::Future(Box::pin(async move {
                        Some(WorkflowAction::Finished { id })
                    }))]
                }
            }

            WorkflowAction::Finished { .. } | WorkflowAction::Aborted { .. } => {
                // Terminal actions, no effects
                smallvec![Effect::None]
            }

            WorkflowAction::Ping => {
                state.pings += 1;
                let value = state.pings;
                smallvec![Effect::Future(Box::pin(async move {
                    Some(WorkflowAction::Pong { value })
                }))]
            }

            WorkflowAction::Pong { .. } => {
                smallvec![Effect::None]
            }
        }
    }
}

/// Count available actions in receiver without blocking
fn drain_receiver(rx: &mut tokio::sync::broadcast::Receiver<WorkflowAction>) -> usize {
    let mut count = 0;
    loop {
        match rx.try_recv() {
            Ok(_) => count += 1,
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    count
}

// ============================================================================
// Tests
// ============================================================================

/// Waiting for a terminal action that is produced by the first effect.
#[tokio::test]
async fn send_and_wait_for_returns_immediate_response() {
    let store = Store::new(WorkflowState::default(), WorkflowReducer, WorkflowEnv);

    let result = store
        .send_and_wait_for(
            WorkflowAction::Ping,
            |action| matches!(action, WorkflowAction::Pong { .. }),
            Duration::from_secs(1),
        )
        .await;

    assert!(result.is_ok());
    assert!(matches!(result.unwrap(), WorkflowAction::Pong { value: 1 }));
}

/// Waiting for the terminal action of a multi-step chain.
#[tokio::test]
async fn send_and_wait_for_follows_multi_step_chain() {
    let store = Store::new(WorkflowState::default(), WorkflowReducer, WorkflowEnv);

    let result = store
        .send_and_wait_for(
            WorkflowAction::Begin { id: 42 },
            |action| matches!(action, WorkflowAction::Finished { id: 42 }),
            Duration::from_secs(1),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap(), WorkflowAction::Finished { id: 42 });

    // All three stages ran in order
    let stages = store.state(|s| s.stages_seen.clone()).await;
    assert_eq!(stages, vec![1, 2, 3]);
}

/// Timeout fires when the expected terminal action never arrives.
#[tokio::test]
async fn send_and_wait_for_times_out() {
    let store = Store::new(WorkflowState::default(), WorkflowReducer, WorkflowEnv);

    let result = store
        .send_and_wait_for(
            WorkflowAction::Begin { id: 99 },
            |action| matches!(action, WorkflowAction::Aborted { id: 99, .. }),
            Duration::from_millis(50),
        )
        .await;

    assert!(result.is_err());
    assert!(matches!(
        result.unwrap_err(),
        event360_runtime::StoreError::Timeout
    ));
}

/// Concurrent waiters filter on their own correlation IDs.
#[tokio::test]
async fn concurrent_waiters_receive_their_own_results() {
    let store = Arc::new(Store::new(
        WorkflowState::default(),
        WorkflowReducer,
        WorkflowEnv,
    ));

    let mut handles = vec![];

    for id in 1..=5 {
        let store_clone = Arc::clone(&store);
        let handle = tokio::spawn(async move {
            store_clone
                .send_and_wait_for(
                    WorkflowAction::Begin { id },
                    move |action| {
                        matches!(action, WorkflowAction::Finished { id: done } if *done == id)
                    },
                    Duration::from_secs(2),
                )
                .await
        });
        handles.push(handle);
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.expect("Task panicked");
        assert!(result.is_ok(), "Workflow {} should complete", i + 1);
    }

    // 5 workflows of 3 stages each all recorded their stages
    let stages = store.state(|s| s.stages_seen.clone()).await;
    assert_eq!(stages.len(), 15, "Expected 15 total stages from 5 workflows");
}

/// Subscribers see every action produced by effects, in real time.
#[tokio::test]
async fn subscribers_stream_all_feedback_actions() {
    let store = Arc::new(Store::new(
        WorkflowState::default(),
        WorkflowReducer,
        WorkflowEnv,
    ));

    let mut rx = store.subscribe_actions();

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = Arc::clone(&received);

    tokio::spawn(async move {
        let mut count = 0;
        while count < 4 {
            // Expect 4 actions: StageDone(1,2,3), Finished
            if let Ok(action) = rx.recv().await {
                received_clone.lock().await.push(action);
                count += 1;
            }
        }
    });

    // Give subscriber time to set up
    tokio::time::sleep(Duration::from_millis(10)).await;

    store.send(WorkflowAction::Begin { id: 100 }).await.ok();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let actions = received.lock().await;
    assert_eq!(actions.len(), 4);
    assert!(matches!(
        actions[0],
        WorkflowAction::StageDone { id: 100, stage: 1 }
    ));
    assert!(matches!(
        actions[1],
        WorkflowAction::StageDone { id: 100, stage: 2 }
    ));
    assert!(matches!(
        actions[2],
        WorkflowAction::StageDone { id: 100, stage: 3 }
    ));
    assert!(matches!(actions[3], WorkflowAction::Finished { id: 100 }));
}

/// Only feedback actions are broadcast, never the action passed to `send`.
#[tokio::test]
async fn initial_actions_are_not_broadcast() {
    let store = Arc::new(Store::new(
        WorkflowState::default(),
        WorkflowReducer,
        WorkflowEnv,
    ));

    let mut rx = store.subscribe_actions();

    store.send(WorkflowAction::Ping).await.ok();

    tokio::time::sleep(Duration::from_millis(50)).await;

    // Should only receive Pong (from effect), not Ping (initial)
    let actions: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();

    assert_eq!(actions.len(), 1);
    assert!(matches!(actions[0], WorkflowAction::Pong { .. }));
}

/// Actions fired by `Effect::Delay` are broadcast like any other feedback.
#[tokio::test]
async fn delayed_actions_are_broadcast() {
    #[derive(Debug, Clone, PartialEq)]
    enum DelayAction {
        Start,
        Fired,
    }

    #[derive(Clone, Default)]
    struct DelayState;

    #[derive(Clone)]
    struct DelayReducer;

    impl Reducer for DelayReducer {
        type State = DelayState;
        type Action = DelayAction;
        type Environment = WorkflowEnv;

        fn reduce(
            &self,
            _state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                DelayAction::Start => smallvec![Effect::Delay {
                    duration: Duration::from_millis(10),
                    action: Box::new(DelayAction::Fired),
                }],
                DelayAction::Fired => smallvec![Effect::None],
            }
        }
    }

    let store = Store::new(DelayState, DelayReducer, WorkflowEnv);
    let mut rx = store.subscribe_actions();

    store.send(DelayAction::Start).await.ok();

    let action = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("Timeout waiting for delayed action")
        .expect("Channel closed");

    assert_eq!(action, DelayAction::Fired);
}

/// Actions from effects inside `Effect::Sequential` arrive in order.
#[tokio::test]
async fn sequential_effect_actions_arrive_in_order() {
    #[derive(Debug, Clone, PartialEq)]
    enum SeqAction {
        Start,
        First,
        Second,
    }

    #[derive(Clone, Default)]
    struct SeqState;

    #[derive(Clone)]
    struct SeqReducer;

    impl Reducer for SeqReducer {
        type State = SeqState;
        type Action = SeqAction;
        type Environment = WorkflowEnv;

        fn reduce(
            &self,
            _state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                SeqAction::Start => smallvec![Effect::Sequential(vec![
                    Effect::Future(Box::pin(async {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Some(SeqAction::First)
                    })),
                    Effect::Future(Box::pin(async {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Some(SeqAction::Second)
                    })),
                ])],
                SeqAction::First | SeqAction::Second => smallvec![Effect::None],
            }
        }
    }

    let store = Arc::new(Store::new(SeqState, SeqReducer, WorkflowEnv));

    let mut rx = store.subscribe_actions();

    store.send(SeqAction::Start).await.ok();

    let action1 = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("Timeout")
        .expect("Channel closed");
    let action2 = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("Timeout")
        .expect("Channel closed");

    assert_eq!(action1, SeqAction::First);
    assert_eq!(action2, SeqAction::Second);
}

/// Independent subscribers each receive the full action stream.
#[tokio::test]
async fn independent_subscribers_see_the_same_stream() {
    let store = Arc::new(Store::new(
        WorkflowState::default(),
        WorkflowReducer,
        WorkflowEnv,
    ));

    let mut rx1 = store.subscribe_actions();
    let mut rx2 = store.subscribe_actions();

    store.send(WorkflowAction::Ping).await.ok();
    store.send(WorkflowAction::Ping).await.ok();

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(drain_receiver(&mut rx1), 2);
    assert_eq!(drain_receiver(&mut rx2), 2);
}

/// A slow subscriber lags rather than blocking the store.
#[tokio::test]
async fn lagging_subscriber_skips_old_actions() {
    // Small capacity to force overflow
    let store = Arc::new(Store::with_broadcast_capacity(
        WorkflowState::default(),
        WorkflowReducer,
        WorkflowEnv,
        4,
    ));

    let mut rx = store.subscribe_actions();

    for _ in 0..20 {
        store.send(WorkflowAction::Ping).await.ok();
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut received = 0;
    let mut lagged = false;

    loop {
        match rx.try_recv() {
            Ok(_) => received += 1,
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => {
                lagged = true;
                continue;
            }
            Err(_) => break,
        }
    }

    assert!(lagged, "Expected subscriber to lag");
    assert!(received > 0, "Should receive at least some actions");
    assert!(received < 20, "Should not receive all actions if lagged");
}

/// Dropping the store closes the action channel for waiting subscribers.
#[tokio::test]
async fn store_drop_closes_subscriber_channel() {
    use tokio::sync::oneshot;

    let store = Arc::new(Store::new(
        WorkflowState::default(),
        WorkflowReducer,
        WorkflowEnv,
    ));

    let (tx, rx) = oneshot::channel();

    let mut subscriber = store.subscribe_actions();
    let wait_handle = tokio::spawn(async move {
        // Signal that we're about to wait
        tx.send(()).ok();
        subscriber.recv().await
    });

    rx.await.ok();

    // Give it a moment to actually be waiting
    tokio::time::sleep(Duration::from_millis(50)).await;

    drop(store);

    let result = wait_handle.await.expect("Task panicked");
    assert!(matches!(
        result,
        Err(tokio::sync::broadcast::error::RecvError::Closed)
    ));
}

/// Terminal failure actions travel the same broadcast path.
#[tokio::test]
async fn failure_actions_are_broadcast() {
    #[derive(Debug, Clone, PartialEq)]
    enum FallibleAction {
        Start,
        Failed { reason: String },
    }

    #[derive(Clone, Default)]
    struct FallibleState;

    #[derive(Clone)]
    struct FallibleReducer;

    impl Reducer for FallibleReducer {
        type State = FallibleState;
        type Action = FallibleAction;
        type Environment = WorkflowEnv;

        fn reduce(
            &self,
            _state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                FallibleAction::Start => smallvec![Effect::Future(Box::pin(async {
                    Some(FallibleAction::Failed {
                        reason: "remote unavailable".to_string(),
                    })
                }))],
                FallibleAction::Failed { .. } => smallvec![Effect::None],
            }
        }
    }

    let store = Store::new(FallibleState, FallibleReducer, WorkflowEnv);

    let result = store
        .send_and_wait_for(
            FallibleAction::Start,
            |action| matches!(action, FallibleAction::Failed { .. }),
            Duration::from_secs(1),
        )
        .await;

    assert!(result.is_ok());
    if let Ok(FallibleAction::Failed { reason }) = result {
        assert_eq!(reason, "remote unavailable");
    } else {
        panic!("Expected Failed action");
    }
}
