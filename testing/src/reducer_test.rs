//! Given/When/Then harness for reducers.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use coral_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Drives one reducer call and checks what came out.
///
/// Actions passed to [`given_actions`](Self::given_actions) are reduced first
/// and their effects dropped; effect assertions only see the effects of the
/// action under test.
///
/// ```ignore
/// use coral_testing::{assertions, ReducerTest};
///
/// ReducerTest::new(WizardReducer::new())
///     .with_env(environment())
///     .given_state(started())
///     .given_actions([WizardAction::SelectDate { date }])
///     .when_action(WizardAction::SelectTimeslot { timeslot_id: 11 })
///     .then_state(|state| assert_eq!(state.selection().map(|s| s.adults), Some(1)))
///     .then_effects(assertions::assert_has_future_effect)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    setup_actions: Vec<A>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Harness around `reducer`.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            setup_actions: Vec::new(),
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Environment handed to every reduce call.
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Starting state.
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Actions reduced before the one under test.
    #[must_use]
    pub fn given_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.setup_actions.extend(actions);
        self
    }

    /// The action under test.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Check the state after the action.
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Check the effects of the action.
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Reduce and run every assertion.
    ///
    /// # Panics
    ///
    /// Panics if the state, action or environment was not given, or if an
    /// assertion fails.
    #[allow(clippy::expect_used)]
    pub fn run(self) {
        let env = self.environment.expect("call with_env() before run()");
        let mut state = self.initial_state.expect("call given_state() before run()");
        let action = self.action.expect("call when_action() before run()");

        for setup in self.setup_actions {
            drop(self.reducer.reduce(&mut state, setup, &env));
        }
        let effects = self.reducer.reduce(&mut state, action, &env);

        self.state_assertions
            .into_iter()
            .for_each(|assertion| assertion(&state));
        self.effect_assertions
            .into_iter()
            .for_each(|assertion| assertion(&effects));
    }
}

/// Effect checks for [`ReducerTest::then_effects`].
pub mod assertions {
    use coral_core::effect::Effect;

    fn contains_future<A>(effect: &Effect<A>) -> bool {
        match effect {
            Effect::Future(_) => true,
            Effect::Parallel(inner) => inner.iter().any(contains_future),
            Effect::None => false,
        }
    }

    /// Nothing but [`Effect::None`].
    ///
    /// # Panics
    ///
    /// Panics on any real effect.
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "expected no effects, got {effects:?}"
        );
    }

    /// Exactly `expected` effects.
    ///
    /// # Panics
    ///
    /// Panics on a different count.
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(effects.len(), expected, "unexpected number of effects");
    }

    /// At least one [`Effect::Future`], possibly nested in `Parallel`.
    ///
    /// # Panics
    ///
    /// Panics if there is none.
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(contains_future),
            "expected a future effect"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coral_core::{smallvec, SmallVec};

    /// Guest counter capped at `cap`; `Save` persists in the background.
    struct Guests {
        cap: u32,
    }

    #[derive(Debug)]
    enum GuestAction {
        Add,
        Remove,
        Save,
    }

    impl Reducer for Guests {
        type State = u32;
        type Action = GuestAction;
        type Environment = ();

        fn reduce(
            &self,
            count: &mut u32,
            action: GuestAction,
            _env: &(),
        ) -> SmallVec<[Effect<GuestAction>; 4]> {
            match action {
                GuestAction::Add if *count < self.cap => *count += 1,
                GuestAction::Add => {},
                GuestAction::Remove => *count = count.saturating_sub(1),
                GuestAction::Save => {
                    return smallvec![Effect::Parallel(vec![Effect::future(async { None })])];
                },
            }
            smallvec![Effect::None]
        }
    }

    #[test]
    fn setup_actions_run_first() {
        ReducerTest::new(Guests { cap: 4 })
            .with_env(())
            .given_state(1)
            .given_actions([GuestAction::Add, GuestAction::Add])
            .when_action(GuestAction::Remove)
            .then_state(|count| assert_eq!(*count, 2))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn cap_holds() {
        ReducerTest::new(Guests { cap: 2 })
            .with_env(())
            .given_state(2)
            .when_action(GuestAction::Add)
            .then_state(|count| assert_eq!(*count, 2))
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn nested_future_is_found() {
        ReducerTest::new(Guests { cap: 2 })
            .with_env(())
            .given_state(0)
            .when_action(GuestAction::Save)
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }
}
