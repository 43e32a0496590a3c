//! # Coral Runtime
//!
//! Runtime for the Coral Island booking site's reducers.
//!
//! ## Core Components
//!
//! - **Store**: owns state, runs the reducer and executes the effects it returns
//! - **`EffectHandle`**: lets a caller wait for the effects one action started
//! - **Polling**: bounded fixed-interval polling for remote status checks
//!
//! ## Example
//!
//! ```ignore
//! use coral_runtime::Store;
//!
//! let store = Store::new(WizardState::new(), WizardReducer::new(), environment);
//!
//! // Send an action and wait until its effects (persisting, fetching) are done
//! let mut handle = store.send(WizardAction::SelectDate { date }).await?;
//! handle.wait().await;
//!
//! let step = store.state(|s| s.step).await;
//! ```

use coral_core::{effect::Effect, reducer::Reducer};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};

/// Bounded polling with a fixed interval
pub mod poll;

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),
    }
}

pub use error::StoreError;

/// Completion of the effects started by one [`Store::send`].
///
/// Actions fed back by those effects are reduced by the store, but the
/// effects *they* return are not tracked here.
#[derive(Clone)]
pub struct EffectHandle {
    running: Arc<AtomicUsize>,
    done: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let running = Arc::new(AtomicUsize::new(0));
        let (notify, done) = watch::channel(());
        (
            Self {
                running: Arc::clone(&running),
                done,
            },
            EffectTracking { running, notify },
        )
    }

    /// Number of effects still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Wait until every tracked effect has finished.
    pub async fn wait(&mut self) {
        while self.pending() > 0 {
            if self.done.changed().await.is_err() {
                // every tracker is gone
                break;
            }
        }
    }

    /// [`wait`](Self::wait), giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if effects are still running when `timeout` expires.
    #[allow(clippy::result_unit_err)]
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), ()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| ())
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Counter side of an [`EffectHandle`], carried into spawned effects.
#[derive(Clone)]
struct EffectTracking {
    running: Arc<AtomicUsize>,
    notify: watch::Sender<()>,
}

/// Decrements both the handle's and the store's counters when the effect
/// task ends, panicking or not.
struct RunningGuard {
    tracking: EffectTracking,
    store_pending: Arc<AtomicUsize>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.store_pending.fetch_sub(1, Ordering::SeqCst);
        if self.tracking.running.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.tracking.notify.send(());
        }
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicUsize, Duration, Effect, EffectHandle, EffectTracking, Future,
        Instant, Ordering, Reducer, RunningGuard, RwLock, StoreError,
    };

    /// Runtime coordinator for one reducer.
    ///
    /// State lives behind a `RwLock`; [`send`](Self::send) reduces under the
    /// write lock, then spawns the returned effects. Actions produced by
    /// effects are sent back through the same store.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a store with initial state, reducer, and environment.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Stop accepting actions and wait for running effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still
        /// running when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            self.shutdown.store(true, Ordering::Release);

            let started = Instant::now();
            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);
                if pending == 0 {
                    tracing::debug!("Store drained");
                    return Ok(());
                }
                if started.elapsed() >= timeout {
                    tracing::warn!(pending_effects = pending, "Store shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }

        /// Reduce `action` and start its effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] once
        /// [`shutdown`](Self::shutdown) has been called.
        #[tracing::instrument(skip_all, name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();
            let effects = {
                let mut state = self.state.write().await;
                let started = Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                effects
            };

            tracing::trace!(effects = effects.len(), "Reducer finished");
            for effect in effects {
                self.execute(effect, &tracking);
            }
            Ok(handle)
        }

        /// Read state through a closure.
        ///
        /// ```ignore
        /// let step = store.state(|s| s.step).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            f(&*self.state.read().await)
        }

        fn spawn_tracked<Fut>(&self, tracking: &EffectTracking, task: Fut)
        where
            Fut: Future<Output = ()> + Send + 'static,
        {
            tracking.running.fetch_add(1, Ordering::SeqCst);
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let guard = RunningGuard {
                tracking: tracking.clone(),
                store_pending: Arc::clone(&self.pending_effects),
            };

            tokio::spawn(async move {
                let _guard = guard;
                task.await;
            });
        }

        fn execute(&self, effect: Effect<A>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute(effect, tracking);
                    }
                },
                Effect::Future(future) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let store = self.clone();
                    self.spawn_tracked(tracking, async move {
                        let Some(action) = future.await else {
                            return;
                        };
                        if let Err(e) = store.send(action).await {
                            tracing::debug!(error = %e, "Dropped action produced by an effect");
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use coral_core::{smallvec, SmallVec};
    use std::time::Duration;

    /// Seats left on a boat; `Reserve` asks a slow remote for confirmation.
    #[derive(Debug, Clone)]
    struct Boat {
        seats: u32,
        confirmed: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum BoatAction {
        Reserve,
        Confirmed,
        ReserveGroup(u32),
        Noop,
    }

    #[derive(Debug, Clone)]
    struct Remote {
        latency: Duration,
    }

    #[derive(Debug, Clone)]
    struct BoatReducer;

    impl Reducer for BoatReducer {
        type State = Boat;
        type Action = BoatAction;
        type Environment = Remote;

        fn reduce(
            &self,
            boat: &mut Boat,
            action: BoatAction,
            env: &Remote,
        ) -> SmallVec<[Effect<BoatAction>; 4]> {
            let confirm = |latency: Duration| {
                Effect::future(async move {
                    tokio::time::sleep(latency).await;
                    Some(BoatAction::Confirmed)
                })
            };
            match action {
                BoatAction::Reserve if boat.seats > 0 => {
                    boat.seats -= 1;
                    smallvec![confirm(env.latency)]
                },
                BoatAction::ReserveGroup(size) if boat.seats >= size => {
                    boat.seats -= size;
                    smallvec![Effect::merge((0..size).map(|_| confirm(env.latency)))]
                },
                BoatAction::Confirmed => {
                    boat.confirmed += 1;
                    smallvec![Effect::None]
                },
                _ => smallvec![Effect::None],
            }
        }
    }

    fn store(seats: u32) -> Store<Boat, BoatAction, Remote, BoatReducer> {
        Store::new(
            Boat { seats, confirmed: 0 },
            BoatReducer,
            Remote {
                latency: Duration::from_millis(5),
            },
        )
    }

    #[tokio::test]
    async fn reducer_runs_before_send_returns() {
        let store = store(2);

        store.send(BoatAction::Reserve).await.unwrap();
        store.send(BoatAction::Noop).await.unwrap();

        assert_eq!(store.state(|b| b.seats).await, 1);
    }

    #[tokio::test]
    async fn handle_waits_for_effect_and_its_feedback() {
        let store = store(2);

        let mut handle = store.send(BoatAction::Reserve).await.unwrap();
        assert_eq!(handle.pending(), 1);
        handle.wait().await;

        assert_eq!(handle.pending(), 0);
        assert_eq!(store.state(|b| b.confirmed).await, 1);
    }

    #[tokio::test]
    async fn parallel_effects_share_one_handle() {
        let store = store(5);

        let mut handle = store.send(BoatAction::ReserveGroup(3)).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(store.state(|b| (b.seats, b.confirmed)).await, (2, 3));
    }

    #[tokio::test]
    async fn refused_action_has_nothing_to_wait_for() {
        let store = store(0);

        let mut handle = store.send(BoatAction::Reserve).await.unwrap();
        assert_eq!(handle.pending(), 0);
        handle
            .wait_with_timeout(Duration::from_millis(10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_drains_effects_then_rejects_actions() {
        let store = store(1);

        store.send(BoatAction::Reserve).await.unwrap();
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        // the confirmation arrived while draining, so it was dropped
        assert_eq!(store.state(|b| b.confirmed).await, 0);
        assert!(matches!(
            store.send(BoatAction::Reserve).await,
            Err(StoreError::ShutdownInProgress)
        ));
    }

    #[tokio::test]
    async fn shutdown_times_out_on_slow_effects() {
        let store = Store::new(
            Boat {
                seats: 1,
                confirmed: 0,
            },
            BoatReducer,
            Remote {
                latency: Duration::from_secs(5),
            },
        );

        store.send(BoatAction::Reserve).await.unwrap();
        let result = store.shutdown(Duration::from_millis(30)).await;

        assert!(matches!(result, Err(StoreError::ShutdownTimeout(1))));
    }
}
