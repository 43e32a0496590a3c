//! Reducer of the booking wizard.

use crate::availability::{AvailabilityCache, Month};
use crate::selection::{BookingSelection, SelectionPatch};
use crate::wizard::{WizardAction, WizardEnvironment, WizardState, WizardStep, WizardWarning};
use coral_core::{effect::Effect, reducer::Reducer};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;

type Effects = SmallVec<[Effect<WizardAction>; 4]>;

/// Reducer for the date/time, add-ons and summary steps.
///
/// Refused actions change nothing but [`WizardState::warning`]. Every change
/// to the draft is followed by an effect that persists it.
#[derive(Debug, Clone, Copy, Default)]
pub struct WizardReducer;

impl WizardReducer {
    /// Create a new wizard reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for WizardReducer {
    type State = WizardState;
    type Action = WizardAction;
    type Environment = WizardEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let name = action.name();
        metrics::counter!("coral_wizard_actions_total", "action" => name).increment(1);

        if action.is_user_action() {
            state.warning = None;
        }

        match Self::apply(state, action, env) {
            Ok(effects) => effects,
            Err(warning) => {
                tracing::debug!(action = name, ?warning, "Wizard action refused");
                state.warning = Some(warning);
                smallvec![Effect::None]
            },
        }
    }
}

impl WizardReducer {
    /// Handle one action; an `Err` leaves the state untouched.
    #[allow(clippy::too_many_lines)]
    fn apply(
        state: &mut WizardState,
        action: WizardAction,
        env: &WizardEnvironment,
    ) -> Result<Effects, WizardWarning> {
        match action {
            WizardAction::Start {
                event_id,
                ticket,
                addons,
            } => {
                let selection = BookingSelection::new(event_id, ticket, &addons);
                *state = WizardState {
                    selection: Some(selection.clone()),
                    ..WizardState::default()
                };

                let month = load_month(state, env, Month::containing(env.clock().today()));
                Ok(smallvec![Effect::merge(
                    std::iter::once(persist(env, selection)).chain(month)
                )])
            },

            WizardAction::Restore { mut selection } => {
                let today = env.clock().today();
                if selection.booking_date.is_some_and(|date| date < today) {
                    selection.booking_date = None;
                    selection.clear_timeslot();
                }
                let month = Month::containing(selection.booking_date.unwrap_or(today));
                *state = WizardState {
                    selection: Some(selection),
                    ..WizardState::default()
                };
                Ok(load_month(state, env, month).into_iter().collect())
            },

            WizardAction::SelectDate { date } => {
                let today = env.clock().today();
                let selection = state.selection.as_mut().ok_or(WizardWarning::NoTicket)?;
                if date < today {
                    return Err(WizardWarning::DateInPast);
                }
                if state.availability.is_blocked(date) {
                    return Err(WizardWarning::DateUnavailable);
                }

                selection.booking_date = Some(date);
                reconcile_selection(selection, &state.availability);
                let snapshot = selection.clone();

                let month = load_month(state, env, Month::containing(date));
                Ok(smallvec![Effect::merge(
                    std::iter::once(persist(env, snapshot)).chain(month)
                )])
            },

            WizardAction::SelectTimeslot { timeslot_id } => {
                let selection = state.selection.as_mut().ok_or(WizardWarning::NoTicket)?;
                let date = selection.booking_date.ok_or(WizardWarning::SelectDateFirst)?;
                let slot = state
                    .availability
                    .effective_slots(selection.ticket.id, date, &selection.ticket.time_slots)
                    .iter()
                    .find(|slot| slot.id == timeslot_id && !slot.disabled)
                    .cloned()
                    .ok_or(WizardWarning::TimeslotUnavailable)?;

                selection.apply_timeslot(&slot);
                selection.adults = selection.ticket.min_guest;
                selection.children = selection
                    .children
                    .min(selection.ticket.max_guest.saturating_sub(selection.adults));
                selection.clamp_addons();
                Ok(smallvec![persist(env, selection.clone())])
            },

            WizardAction::IncrementAdults => edit_guests(state, env, |selection| {
                let max = selection.ticket.max_guest;
                if selection.adults >= max || selection.total_guests() >= max {
                    return Err(WizardWarning::MaxGuestsReached { max });
                }
                selection.adults += 1;
                Ok(())
            }),

            WizardAction::DecrementAdults => edit_guests(state, env, |selection| {
                let min = selection.ticket.min_guest;
                if selection.adults <= min || selection.adults == 0 {
                    return Err(WizardWarning::MinAdultsReached { min });
                }
                selection.adults -= 1;
                Ok(())
            }),

            WizardAction::IncrementChildren => edit_guests(state, env, |selection| {
                let max = selection.ticket.max_guest;
                if selection.children >= max || selection.total_guests() >= max {
                    return Err(WizardWarning::MaxGuestsReached { max });
                }
                selection.children += 1;
                Ok(())
            }),

            WizardAction::DecrementChildren => edit_guests(state, env, |selection| {
                if selection.children == 0 {
                    return Err(WizardWarning::NoChildren);
                }
                selection.children -= 1;
                Ok(())
            }),

            WizardAction::SetAddonQuantity { addon_id, quantity } => {
                edit_addon(state, env, addon_id, |addon, guests| {
                    if quantity > guests {
                        return Err(WizardWarning::AddOnLimit { max: guests });
                    }
                    addon.set_quantity(quantity);
                    Ok(())
                })
            },

            WizardAction::ToggleAddon { addon_id } => {
                edit_addon(state, env, addon_id, |addon, guests| {
                    if addon.selected {
                        addon.set_quantity(0);
                    } else if guests == 0 {
                        return Err(WizardWarning::AddOnLimit { max: 0 });
                    } else {
                        addon.set_quantity(1);
                    }
                    Ok(())
                })
            },

            WizardAction::Advance => {
                if !state.can_proceed(state.step) {
                    return Err(WizardWarning::StepIncomplete);
                }
                if let Some(next) = state.steps().get(state.step_index() + 1) {
                    state.step = *next;
                }
                Ok(smallvec![Effect::None])
            },

            WizardAction::Retreat => {
                let index = state.step_index();
                if index > 0 {
                    state.step = state.steps()[index - 1];
                }
                Ok(smallvec![Effect::None])
            },

            WizardAction::JumpTo { step } => {
                let current = state.step_index();
                let target = state
                    .steps()
                    .iter()
                    .position(|candidate| *candidate == step)
                    .ok_or(WizardWarning::StepUnreachable)?;

                let allowed =
                    target <= current || (target == current + 1 && state.can_proceed(state.step));
                if !allowed {
                    return Err(WizardWarning::StepUnreachable);
                }
                state.step = step;
                Ok(smallvec![Effect::None])
            },

            WizardAction::ProceedToCheckout => {
                if state.step != WizardStep::Summary {
                    return Err(WizardWarning::NotOnSummary);
                }
                if !state.can_proceed(WizardStep::DateTime) {
                    return Err(WizardWarning::StepIncomplete);
                }
                let selection = state.selection.clone().ok_or(WizardWarning::NoTicket)?;
                state.checkout_ready = true;
                tracing::info!(ticket = %selection.ticket.slug, "Booking selection handed to checkout");
                Ok(smallvec![persist(env, selection)])
            },

            WizardAction::BackToTickets => {
                *state = WizardState::default();
                let store = Arc::clone(env.selection_store());
                Ok(smallvec![Effect::future(async move {
                    store.clear().await;
                    None
                })])
            },

            WizardAction::LoadMonth { month } => {
                Ok(load_month(state, env, month).into_iter().collect())
            },

            WizardAction::MonthLoaded { month, days } => {
                if !state.availability.is_loading(month) {
                    tracing::debug!(%month, "Ignoring availability for a month no longer requested");
                    return Ok(smallvec![Effect::None]);
                }
                state.availability.merge_month(month, days);

                let Some(selection) = state.selection.as_mut() else {
                    return Ok(smallvec![Effect::None]);
                };
                match reconcile_selection(selection, &state.availability) {
                    Reconciled::Unchanged => Ok(smallvec![Effect::None]),
                    Reconciled::Repriced(patch) => Ok(smallvec![persist_patch(env, patch)]),
                    Reconciled::SlotDropped => Ok(smallvec![persist(env, selection.clone())]),
                    Reconciled::DateClosed => {
                        let snapshot = selection.clone();
                        tracing::info!(%month, "Chosen date closed after availability loaded");
                        state.step = WizardStep::DateTime;
                        state.warning = Some(WizardWarning::DateUnavailable);
                        Ok(smallvec![persist(env, snapshot)])
                    },
                }
            },

            WizardAction::MonthFailed { month, error } => {
                state.availability.abandon_loading(month);
                tracing::warn!(%month, %error, "Failed to load availability; calendar shows defaults");
                Ok(smallvec![Effect::None])
            },

            WizardAction::DismissWarning => {
                state.warning = None;
                Ok(smallvec![Effect::None])
            },
        }
    }
}

/// Persist a snapshot of the draft.
fn persist(env: &WizardEnvironment, selection: BookingSelection) -> Effect<WizardAction> {
    let store = Arc::clone(env.selection_store());
    Effect::future(async move {
        store.set(selection).await;
        None
    })
}

/// Persist only the fields in `patch`.
fn persist_patch(env: &WizardEnvironment, patch: SelectionPatch) -> Effect<WizardAction> {
    let store = Arc::clone(env.selection_store());
    Effect::future(async move {
        store.update(&patch).await;
        None
    })
}

/// Start fetching a month unless it is cached, in flight, or already over.
fn load_month(
    state: &mut WizardState,
    env: &WizardEnvironment,
    month: Month,
) -> Option<Effect<WizardAction>> {
    let ticket_id = state.selection.as_ref()?.ticket.id;
    if month.last_day() < env.clock().today() || !state.availability.begin_loading(month) {
        return None;
    }

    let api = Arc::clone(env.api());
    Some(Effect::future(async move {
        match api
            .availability(ticket_id, month.first_day(), month.last_day())
            .await
        {
            Ok(days) => Some(WizardAction::MonthLoaded { month, days }),
            Err(e) => Some(WizardAction::MonthFailed {
                month,
                error: e.to_string(),
            }),
        }
    }))
}

/// How [`reconcile_selection`] changed the draft.
#[derive(Debug)]
enum Reconciled {
    Unchanged,
    /// Same slot, new label or prices
    Repriced(SelectionPatch),
    /// The slot is no longer offered on the chosen date
    SlotDropped,
    /// The chosen date is closed; date and slot are gone
    DateClosed,
}

/// Re-check the chosen date and slot against what is now known to be open.
///
/// A closed date loses the date and the slot. A slot still offered takes its
/// date-specific label and prices; one no longer offered is cleared.
fn reconcile_selection(
    selection: &mut BookingSelection,
    availability: &AvailabilityCache,
) -> Reconciled {
    let Some(date) = selection.booking_date else {
        return Reconciled::Unchanged;
    };
    if availability.is_blocked(date) {
        selection.booking_date = None;
        selection.clear_timeslot();
        return Reconciled::DateClosed;
    }
    let Some(timeslot_id) = selection.timeslot_id else {
        return Reconciled::Unchanged;
    };

    let offered = availability
        .effective_slots(selection.ticket.id, date, &selection.ticket.time_slots)
        .iter()
        .find(|slot| slot.id == timeslot_id && !slot.disabled)
        .cloned();

    match offered {
        Some(slot) => {
            let patch = SelectionPatch {
                timeslot_label: Some(slot.label()),
                adult_price: Some(slot.adult_price),
                child_price: Some(slot.child_price),
                ..SelectionPatch::default()
            };
            if selection.apply(&patch) {
                Reconciled::Repriced(patch)
            } else {
                Reconciled::Unchanged
            }
        },
        None => {
            selection.clear_timeslot();
            Reconciled::SlotDropped
        },
    }
}

/// Apply a guest-count edit; requires a chosen slot.
fn edit_guests<F>(
    state: &mut WizardState,
    env: &WizardEnvironment,
    edit: F,
) -> Result<Effects, WizardWarning>
where
    F: FnOnce(&mut BookingSelection) -> Result<(), WizardWarning>,
{
    let selection = state.selection.as_mut().ok_or(WizardWarning::NoTicket)?;
    if selection.timeslot_id.is_none() {
        return Err(WizardWarning::SelectTimeslotFirst);
    }

    edit(selection)?;
    selection.clamp_addons();
    Ok(smallvec![persist(env, selection.clone())])
}

/// Apply an add-on edit given the guest total.
fn edit_addon<F>(
    state: &mut WizardState,
    env: &WizardEnvironment,
    addon_id: u64,
    edit: F,
) -> Result<Effects, WizardWarning>
where
    F: FnOnce(&mut crate::selection::SelectedAddOn, u32) -> Result<(), WizardWarning>,
{
    let selection = state.selection.as_mut().ok_or(WizardWarning::NoTicket)?;
    let guests = selection.total_guests();
    let addon = selection
        .addons
        .iter_mut()
        .find(|addon| addon.id == addon_id)
        .ok_or(WizardWarning::UnknownAddOn)?;

    edit(addon, guests)?;
    Ok(smallvec![persist(env, selection.clone())])
}
