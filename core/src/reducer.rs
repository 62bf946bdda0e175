//! The Reducer trait, the core abstraction for business logic.
//!
//! Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
//! They contain all business logic and are deterministic and testable without
//! any runtime, which is what makes intermediate workflow states assertable
//! in plain unit tests.

use crate::effect::Effect;
use smallvec::SmallVec;

/// Core abstraction for business logic.
///
/// # Type Parameters
///
/// - `State`: The domain state this reducer operates on
/// - `Action`: The action type this reducer processes
/// - `Environment`: The injected dependencies this reducer needs
///
/// # Example
///
/// ```ignore
/// impl Reducer for CatalogReducer {
///     type State = CatalogState;
///     type Action = CatalogAction;
///     type Environment = CatalogEnvironment;
///
///     fn reduce(
///         &self,
///         state: &mut CatalogState,
///         action: CatalogAction,
///         env: &CatalogEnvironment,
///     ) -> SmallVec<[Effect<CatalogAction>; 4]> {
///         match action {
///             CatalogAction::Load { event_id } => {
///                 state.loading = true;
///                 smallvec![/* fetch effect */]
///             }
///             _ => smallvec![Effect::None],
///         }
///     }
/// }
/// ```
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// The environment type with injected dependencies
    type Environment;

    /// Reduce an action into state changes and effects.
    ///
    /// This is a pure function that:
    /// 1. Validates the action against the current state
    /// 2. Updates state in place
    /// 3. Returns effect descriptions to be executed by the runtime
    ///
    /// # Arguments
    ///
    /// - `state`: Mutable reference to current state
    /// - `action`: The action to process
    /// - `env`: Reference to injected dependencies
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]>;
}
