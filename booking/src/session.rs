//! Per-browser booking sessions.
//!
//! Each `coral_session` cookie owns one [`BookingSession`]: its draft
//! selection, currency preference and a wizard store. Sessions are mounted
//! from storage on first use and dropped from memory after a period of
//! inactivity; persisted state outlives eviction.

use crate::currency::CurrencyStore;
use crate::selection::SelectionStore;
use crate::storage::{KeyValueStorage, SessionStorage};
use crate::wizard::{WizardAction, WizardEnvironment, WizardReducer, WizardState, WizardStore};
use coral_api::BookingApi;
use coral_core::environment::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

/// Server-side state of one browser.
pub struct BookingSession {
    id: Uuid,
    selection: Arc<SelectionStore>,
    currency: CurrencyStore,
    wizard: WizardStore,
    last_seen: Mutex<Instant>,
}

impl std::fmt::Debug for BookingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingSession")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl BookingSession {
    /// Session id from the cookie.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Draft selection.
    #[must_use]
    pub fn selection(&self) -> &Arc<SelectionStore> {
        &self.selection
    }

    /// Currency preference.
    #[must_use]
    pub const fn currency(&self) -> &CurrencyStore {
        &self.currency
    }

    /// Wizard store.
    #[must_use]
    pub const fn wizard(&self) -> &WizardStore {
        &self.wizard
    }

    async fn touch(&self) {
        *self.last_seen.lock().await = Instant::now();
    }

    async fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_seen.lock().await)
    }
}

/// Sessions currently held in memory.
pub struct SessionRegistry {
    storage: Arc<dyn KeyValueStorage>,
    api: Arc<dyn BookingApi>,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<Uuid, Arc<BookingSession>>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("backend", &self.storage.backend())
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        api: Arc<dyn BookingApi>,
        clock: Arc<dyn Clock>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            api,
            clock,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Storage backend shared by all sessions.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    /// Session for `id`, mounting it from storage if it is not in memory.
    pub async fn session(&self, id: Uuid) -> Arc<BookingSession> {
        if let Some(session) = self.sessions.read().await.get(&id).cloned() {
            session.touch().await;
            return session;
        }

        let mounted = Arc::new(self.mount(id).await);
        let mut sessions = self.sessions.write().await;
        let session = Arc::clone(sessions.entry(id).or_insert(mounted));
        record_active(sessions.len());
        drop(sessions);
        session.touch().await;
        session
    }

    async fn mount(&self, id: Uuid) -> BookingSession {
        let storage = SessionStorage::new(Arc::clone(&self.storage), id);
        let selection = Arc::new(SelectionStore::mount(storage.clone()).await);
        let environment = WizardEnvironment::new(
            Arc::clone(&self.api),
            Arc::clone(&selection),
            Arc::clone(&self.clock),
        );
        let wizard = WizardStore::new(WizardState::new(), WizardReducer::new(), environment);

        if let Some(draft) = selection.current().await {
            tracing::debug!(session_id = %id, ticket = %draft.ticket.slug, "Restoring booking draft");
            if let Err(e) = wizard.send(WizardAction::Restore { selection: draft }).await {
                tracing::warn!(session_id = %id, error = %e, "Failed to restore booking draft");
            }
        }

        tracing::debug!(session_id = %id, "Mounted session");
        BookingSession {
            id,
            selection,
            currency: CurrencyStore::new(storage),
            wizard,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    /// Number of sessions in memory.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is in memory.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than the timeout; returns how many.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut idle = Vec::new();
        for (id, session) in self.sessions.read().await.iter() {
            if session.idle_for(now).await > self.idle_timeout {
                idle.push(*id);
            }
        }

        if idle.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        for id in &idle {
            sessions.remove(id);
        }
        record_active(sessions.len());
        tracing::debug!(evicted = idle.len(), remaining = sessions.len(), "Evicted idle sessions");
        idle.len()
    }

    /// Stop every wizard store, waiting up to `timeout` for pending draft
    /// writes. Returns how many sessions did not drain in time.
    pub async fn shutdown(&self, timeout: Duration) -> usize {
        let sessions: Vec<_> = self.sessions.read().await.values().cloned().collect();
        let mut stuck = 0;
        for session in sessions {
            if let Err(e) = session.wizard.shutdown(timeout).await {
                tracing::warn!(session_id = %session.id, error = %e, "Session did not drain");
                stuck += 1;
            }
        }
        tracing::info!(stuck, "Sessions stopped");
        stuck
    }

    /// Evict idle sessions every `every` until the registry is dropped.
    #[must_use]
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let registry: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.evict_idle().await;
            }
        })
    }
}

fn record_active(count: usize) {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    metrics::gauge!("coral_sessions_active").set(f64::from(count));
}
