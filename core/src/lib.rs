//! # Reception Core
//!
//! Core traits and domain types for the reception check-in desk.
//!
//! The desk is built with the Reducer pattern: every input (a scanned code, a
//! typed identifier, an API response) is an action, a pure reducer turns it
//! into state changes plus effect descriptions, and the runtime store executes
//! those effects and feeds their results back in as new actions.
//!
//! ## Core Concepts
//!
//! - **State**: Session state of the desk (selected event, loaded person, modal)
//! - **Action**: All possible inputs to the reducer
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits ([`api::ReceptionApi`],
//!   [`storage::SettingsStore`], [`scanner::CodeReader`], [`environment::Clock`])
//!
//! ## Example
//!
//! ```ignore
//! use reception_core::*;
//!
//! impl Reducer for DeskReducer {
//!     type State = DeskState;
//!     type Action = DeskAction;
//!     type Environment = DeskEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut DeskState,
//!         action: DeskAction,
//!         env: &DeskEnvironment,
//!     ) -> SmallVec<[Effect<DeskAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// REST API contract consumed by the desk
pub mod api;

/// Domain model: configuration, events, people, bookings
pub mod model;

/// External decode-from-camera capability
pub mod scanner;

/// Persistence of the configuration record
pub mod storage;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution).
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Delayed action (toast expiry)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async computation that always yields a follow-up action
        pub fn task<F>(future: F) -> Self
        where
            F: Future<Output = Action> + Send + 'static,
        {
            Effect::Future(Box::pin(async move { Some(future.await) }))
        }

        /// Wrap an async computation that is run only for its side effect
        pub fn fire_and_forget<F>(future: F) -> Self
        where
            F: Future<Output = ()> + Send + 'static,
        {
            Effect::Future(Box::pin(async move {
                future.await;
                None
            }))
        }

        /// Whether this effect does nothing
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// The event window ("ended less than a day ago") and the attended-at
    /// placeholder both read time through this trait.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, SystemClock};

    #[tokio::test]
    async fn test_task_effect_yields_action() {
        let effect: Effect<u32> = Effect::task(async { 7 });
        let Effect::Future(fut) = effect else {
            unreachable!("task always builds a future effect");
        };
        assert_eq!(fut.await, Some(7));
    }

    #[tokio::test]
    async fn test_fire_and_forget_yields_nothing() {
        let effect: Effect<u32> = Effect::fire_and_forget(async {});
        let Effect::Future(fut) = effect else {
            unreachable!("fire_and_forget always builds a future effect");
        };
        assert_eq!(fut.await, None);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn test_effect_debug() {
        let effect: Effect<u32> = Effect::None;
        assert_eq!(format!("{effect:?}"), "Effect::None");
        assert!(effect.is_none());
    }
}
