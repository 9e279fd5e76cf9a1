//! # Reception Runtime
//!
//! Store runtime for the reception check-in desk.
//!
//! The [`Store`] owns the desk state, runs the reducer for every action and
//! executes the returned effects, feeding any action an effect produces back
//! into the reducer.
//!
//! ## Execution model
//!
//! The desk runs on a single cooperative executor. `send` reduces the action
//! under the write lock, releases the lock, then awaits each effect in order,
//! so an action and every follow-up action it causes are strictly
//! sequential. The lock is never held across an effect, which lets a second
//! `send` (a scan arriving while a lookup is in flight) reach the reducer and
//! be rejected there by the state's own guard.
//!
//! `Effect::Delay` is the exception: it is spawned so a toast timer never
//! blocks the workflow.
//!
//! ## Example
//!
//! ```ignore
//! use reception_runtime::Store;
//!
//! let store = Store::new(initial_state, reducer, environment);
//!
//! store.send(DeskAction::LoadEvents).await?;
//!
//! let count = store.state(|s| s.events.len()).await;
//! ```

use reception_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{Arc, AtomicBool, Effect, Ordering, Reducer, RwLock};
    use crate::error::StoreError;
    use futures::future::BoxFuture;
    use tokio::sync::broadcast;

    /// Default capacity of the action broadcast channel
    const DEFAULT_BROADCAST_CAPACITY: usize = 64;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Cloning a store is cheap; clones share state and observers.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        /// Every reduced action is broadcast here after the reducer ran, so
        /// observers (the renderer) always read the post-action state.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(
                initial_state,
                reducer,
                environment,
                DEFAULT_BROADCAST_CAPACITY,
            )
        }

        /// Create a new store with a custom action broadcast capacity
        ///
        /// Slow observers that fall more than `capacity` actions behind
        /// receive a lag notification instead of the dropped actions.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                action_broadcast,
            }
        }

        /// Observe every action the store reduces
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Send an action to the store
        ///
        /// Runs the reducer, then executes the returned effects in order.
        /// Returns once the action and all follow-up actions produced by its
        /// effects have been reduced. Delayed actions are scheduled, not awaited.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::SeqCst) {
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.received").increment(1);

            let effects = {
                let mut state = self.state.write().await;
                self.reducer
                    .reduce(&mut state, action.clone(), &self.environment)
            };

            // No observers is fine
            let _ = self.action_broadcast.send(action);

            for effect in effects {
                self.execute_effect(effect).await;
            }

            Ok(())
        }

        /// Read state via a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Stop accepting new actions
        ///
        /// Effects already running finish, but the actions they produce are
        /// discarded.
        pub fn shutdown(&self) {
            tracing::info!("Store shutting down");
            self.shutdown.store(true, Ordering::SeqCst);
        }

        /// Whether [`Store::shutdown`] was called
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::SeqCst)
        }

        /// Execute one effect description
        ///
        /// - `None`: No-op
        /// - `Future`: Awaited in place, resulting action sent back through the store
        /// - `Delay`: Spawned; the action is sent after the duration elapses
        fn execute_effect(&self, effect: Effect<A>) -> BoxFuture<'_, ()> {
            Box::pin(async move {
                match effect {
                    Effect::None => {
                        tracing::trace!("Executing Effect::None (no-op)");
                        metrics::counter!("store.effects.executed", "type" => "none")
                            .increment(1);
                    },
                    Effect::Future(fut) => {
                        tracing::trace!("Executing Effect::Future");
                        metrics::counter!("store.effects.executed", "type" => "future")
                            .increment(1);

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            if let Err(error) = self.send(action).await {
                                tracing::debug!(%error, "Dropped effect feedback action");
                            }
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    },
                    Effect::Delay { duration, action } => {
                        tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                        metrics::counter!("store.effects.executed", "type" => "delay")
                            .increment(1);

                        let store = self.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(duration).await;
                            if let Err(error) = store.send(*action).await {
                                tracing::debug!(%error, "Dropped delayed action");
                            }
                        });
                    },
                }
            })
        }
    }
}

pub use error::StoreError;
pub use store::Store;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use reception_core::{SmallVec, smallvec};
    use std::time::Duration;

    #[derive(Debug, Clone, Default)]
    struct TestState {
        value: i32,
        busy: bool,
        rejected: u32,
    }

    #[derive(Debug, Clone)]
    enum TestAction {
        Increment,
        StartWork,
        WorkDone,
        DelayedIncrement,
    }

    #[derive(Debug, Clone)]
    struct TestEnv;

    #[derive(Debug, Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::StartWork => {
                    if state.busy {
                        state.rejected += 1;
                        return smallvec![Effect::None];
                    }
                    state.busy = true;
                    smallvec![Effect::task(async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        TestAction::WorkDone
                    })]
                },
                TestAction::WorkDone => {
                    state.busy = false;
                    state.value += 10;
                    smallvec![Effect::None]
                },
                TestAction::DelayedIncrement => smallvec![Effect::Delay {
                    duration: Duration::from_millis(10),
                    action: Box::new(TestAction::Increment),
                }],
            }
        }
    }

    fn test_store() -> Store<TestState, TestAction, TestEnv, TestReducer> {
        Store::new(TestState::default(), TestReducer, TestEnv)
    }

    #[tokio::test]
    async fn test_send_action() {
        let store = test_store();
        store.send(TestAction::Increment).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_future_feedback_completes_before_send_returns() {
        let store = test_store();
        store.send(TestAction::StartWork).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 10);
        assert!(!store.state(|s| s.busy).await);
    }

    #[tokio::test]
    async fn test_lock_released_while_effect_runs() {
        let store = test_store();
        let worker = store.clone();
        let handle = tokio::spawn(async move { worker.send(TestAction::StartWork).await });

        // Wait until the first action is in flight
        while !store.state(|s| s.busy).await {
            tokio::task::yield_now().await;
        }
        store.send(TestAction::StartWork).await.unwrap();
        assert_eq!(store.state(|s| s.rejected).await, 1);

        handle.await.unwrap().unwrap();
        assert_eq!(store.state(|s| s.value).await, 10);
    }

    #[tokio::test]
    async fn test_delay_does_not_block_send() {
        let store = test_store();
        store.send(TestAction::DelayedIncrement).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_actions() {
        let store = test_store();
        store.shutdown();
        assert!(store.is_shutting_down());
        assert_eq!(
            store.send(TestAction::Increment).await,
            Err(StoreError::ShutdownInProgress)
        );
    }
}
