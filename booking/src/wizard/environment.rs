//! Dependencies of the booking wizard.

use crate::selection::SelectionStore;
use coral_api::BookingApi;
use coral_core::environment::Clock;
use std::sync::Arc;

/// Injected dependencies for [`WizardReducer`](super::WizardReducer).
#[derive(Clone)]
pub struct WizardEnvironment {
    api: Arc<dyn BookingApi>,
    selection_store: Arc<SelectionStore>,
    clock: Arc<dyn Clock>,
}

impl WizardEnvironment {
    /// Create an environment.
    #[must_use]
    pub fn new(
        api: Arc<dyn BookingApi>,
        selection_store: Arc<SelectionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            selection_store,
            clock,
        }
    }

    /// Remote API used to fetch availability.
    #[must_use]
    pub fn api(&self) -> &Arc<dyn BookingApi> {
        &self.api
    }

    /// Persistence of the draft.
    #[must_use]
    pub fn selection_store(&self) -> &Arc<SelectionStore> {
        &self.selection_store
    }

    /// Source of "today".
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}
