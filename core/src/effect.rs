//! Side effect descriptions returned by reducers.
//!
//! Effects are NOT executed immediately. They are descriptions of what should
//! happen, returned from reducers and executed by the Store runtime. Keeping
//! them as values is what lets a registration chain (save, fetch QR, send
//! email) be asserted step by step in tests without any remote service.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Describes a side effect to be executed by the runtime.
///
/// # Type Parameters
///
/// - `Action`: The action type that effects can produce (feedback loop)
///
/// # Feedback Loop
///
/// An [`Effect::Future`] resolves to `Option<Action>`; when it is `Some`, the
/// runtime sends that action back into the reducer. Sequential remote chains
/// are built by having each step's completion action trigger the next step's
/// effect.
pub enum Effect<Action> {
    /// No-op effect
    None,

    /// Run effects in parallel
    Parallel(Vec<Effect<Action>>),

    /// Run effects sequentially, each completing before the next starts
    Sequential(Vec<Effect<Action>>),

    /// Dispatch an action after a delay (timeouts, scheduled nudges)
    Delay {
        /// How long to wait
        duration: Duration,
        /// Action to dispatch after the delay
        action: Box<Action>,
    },

    /// Arbitrary async computation.
    ///
    /// Returns `Option<Action>`; if `Some`, the action is fed back into the
    /// reducer. Remote gateway calls are wrapped in this variant.
    Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
}

// Manual Debug implementation since Future does not implement Debug
impl<Action> std::fmt::Debug for Effect<Action>
where
    Action: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::None => write!(f, "Effect::None"),
            Effect::Parallel(effects) => f.debug_tuple("Effect::Parallel").field(effects).finish(),
            Effect::Sequential(effects) => {
                f.debug_tuple("Effect::Sequential").field(effects).finish()
            },
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
    /// Combine effects to run in parallel
    #[must_use]
    pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
        Effect::Parallel(effects)
    }

    /// Chain effects to run sequentially
    #[must_use]
    pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
        Effect::Sequential(effects)
    }

    /// Wrap an async computation that may produce a follow-up action.
    ///
    /// Shorthand for `Effect::Future(Box::pin(fut))`.
    pub fn future<F>(fut: F) -> Effect<Action>
    where
        F: Future<Output = Option<Action>> + Send + 'static,
    {
        Effect::Future(Box::pin(fut))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Loaded,
        Ping,
    }

    #[test]
    fn merge_builds_parallel() {
        let effect: Effect<TestAction> = Effect::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(effect, Effect::Parallel(inner) if inner.len() == 2));
    }

    #[test]
    fn chain_builds_sequential() {
        let effect: Effect<TestAction> = Effect::chain(vec![Effect::None]);
        assert!(matches!(effect, Effect::Sequential(inner) if inner.len() == 1));
    }

    #[test]
    #[allow(clippy::panic)] // Test code
    fn future_resolves_to_action() {
        let effect = Effect::future(async { Some(TestAction::Loaded) });
        match effect {
            Effect::Future(fut) => {
                let action = tokio_test::block_on(fut);
                assert_eq!(action, Some(TestAction::Loaded));
            },
            other => panic!("expected Future effect, got {other:?}"),
        }
    }

    #[test]
    fn debug_hides_future_internals() {
        let effect: Effect<TestAction> = Effect::future(async { None });
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");

        let delay = Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(TestAction::Ping),
        };
        let rendered = format!("{delay:?}");
        assert!(rendered.contains("Effect::Delay"));
        assert!(rendered.contains("Ping"));
    }
}
