//! Tests for the booking wizard reducer.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::availability::Month;
use crate::mocks::{sample_cruise, sample_extras, sample_ticket, FakeBookingApi};
use crate::selection::{BookingSelection, SelectionStore};
use crate::storage::{MemoryStorage, SessionStorage};
use chrono::{NaiveDate, NaiveTime};
use coral_api::{AvailabilityDay, Money, TicketTypeAvailability, TimeSlot};
use coral_core::effect::Effect;
use coral_testing::{assertions, FixedClock, ReducerTest};
use std::sync::Arc;
use uuid::Uuid;

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

fn this_month() -> Month {
    Month::containing(march(1))
}

fn environment_with(api: FakeBookingApi) -> WizardEnvironment {
    let storage = SessionStorage::new(Arc::new(MemoryStorage::new()), Uuid::new_v4());
    let store = tokio_test::block_on(SelectionStore::mount(storage));
    WizardEnvironment::new(
        Arc::new(api),
        Arc::new(store),
        Arc::new(FixedClock::on(march(3))),
    )
}

fn environment() -> WizardEnvironment {
    environment_with(FakeBookingApi::new())
}

fn start() -> WizardAction {
    WizardAction::Start {
        event_id: 1,
        ticket: sample_ticket(),
        addons: sample_extras(),
    }
}

fn slot_override(day: u32, slots: Vec<TimeSlot>) -> AvailabilityDay {
    AvailabilityDay {
        date: march(day),
        active: 1,
        ticket_types: vec![TicketTypeAvailability {
            ticket_id: 3,
            time_slots: slots,
        }],
    }
}

fn closed(day: u32) -> AvailabilityDay {
    AvailabilityDay {
        date: march(day),
        active: 0,
        ticket_types: Vec::new(),
    }
}

fn morning_at(adult: u64) -> TimeSlot {
    TimeSlot {
        id: 11,
        time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        adult_price: Money::from_baht(adult),
        child_price: Money::from_baht(adult / 2),
        disabled: false,
    }
}

/// Started wizard on 2025-03-05, 09:00 slot, one adult.
fn booked_morning() -> Vec<WizardAction> {
    vec![
        start(),
        WizardAction::SelectDate { date: march(5) },
        WizardAction::SelectTimeslot { timeslot_id: 11 },
    ]
}

fn selection(state: &WizardState) -> &BookingSelection {
    state.selection.as_ref().expect("wizard has a draft")
}

#[test]
fn start_offers_eligible_addons_and_loads_current_month() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .when_action(start())
        .then_state(|state| {
            assert_eq!(state.step, WizardStep::DateTime);
            assert_eq!(selection(state).addons.len(), 1);
            assert_eq!(state.steps().len(), 3);
            assert!(state.availability.is_loading(this_month()));
        })
        .then_effects(|effects| {
            // persist and month fetch, run side by side
            assertions::assert_effects_count(effects, 1);
            assert!(matches!(&effects[0], Effect::Parallel(inner) if inner.len() == 2));
        })
        .run();
}

#[test]
fn ticket_without_addons_skips_addons_step() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .when_action(WizardAction::Start {
            event_id: 1,
            ticket: sample_cruise(),
            addons: sample_extras(),
        })
        .then_state(|state| {
            assert_eq!(state.steps(), &[WizardStep::DateTime, WizardStep::Summary]);
        })
        .run();
}

#[test]
fn advance_without_date_is_refused() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start()])
        .when_action(WizardAction::Advance)
        .then_state(|state| {
            assert_eq!(state.step, WizardStep::DateTime);
            assert_eq!(state.warning, Some(WizardWarning::StepIncomplete));
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn past_date_is_refused() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start()])
        .when_action(WizardAction::SelectDate { date: march(2) })
        .then_state(|state| {
            assert_eq!(state.warning, Some(WizardWarning::DateInPast));
            assert_eq!(selection(state).booking_date, None);
        })
        .run();
}

#[test]
fn today_is_bookable() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start()])
        .when_action(WizardAction::SelectDate { date: march(3) })
        .then_state(|state| {
            assert_eq!(state.warning, None);
            assert_eq!(selection(state).booking_date, Some(march(3)));
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn closed_date_is_refused() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([
            start(),
            WizardAction::MonthLoaded {
                month: this_month(),
                days: vec![closed(10)],
            },
        ])
        .when_action(WizardAction::SelectDate { date: march(10) })
        .then_state(|state| {
            assert_eq!(state.warning, Some(WizardWarning::DateUnavailable));
            assert_eq!(selection(state).booking_date, None);
        })
        .run();
}

#[test]
fn selecting_a_timeslot_takes_its_prices_and_minimum_adults() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start(), WizardAction::SelectDate { date: march(5) }])
        .when_action(WizardAction::SelectTimeslot { timeslot_id: 11 })
        .then_state(|state| {
            let selection = selection(state);
            assert_eq!(selection.timeslot_id, Some(11));
            assert_eq!(selection.timeslot_label.as_deref(), Some("09:00"));
            assert_eq!(selection.adults, 1);
            assert_eq!(selection.adult_price, Money::from_baht(500));
            assert_eq!(selection.child_price, Money::from_baht(250));
            assert!(state.can_proceed(WizardStep::DateTime));
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn timeslot_needs_a_date() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start()])
        .when_action(WizardAction::SelectTimeslot { timeslot_id: 11 })
        .then_state(|state| {
            assert_eq!(state.warning, Some(WizardWarning::SelectDateFirst));
        })
        .run();
}

#[test]
fn disabled_timeslot_is_refused() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start(), WizardAction::SelectDate { date: march(5) }])
        .when_action(WizardAction::SelectTimeslot { timeslot_id: 13 })
        .then_state(|state| {
            assert_eq!(state.warning, Some(WizardWarning::TimeslotUnavailable));
            assert_eq!(selection(state).timeslot_id, None);
        })
        .run();
}

#[test]
fn date_override_sets_slot_prices() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([
            start(),
            WizardAction::MonthLoaded {
                month: this_month(),
                days: vec![slot_override(8, vec![morning_at(900)])],
            },
            WizardAction::SelectDate { date: march(8) },
        ])
        .when_action(WizardAction::SelectTimeslot { timeslot_id: 11 })
        .then_state(|state| {
            assert_eq!(selection(state).adult_price, Money::from_baht(900));
        })
        .run();
}

#[test]
fn changing_to_a_date_without_the_slot_clears_it() {
    let afternoon_only = TimeSlot {
        id: 12,
        time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
        adult_price: Money::from_baht(600),
        child_price: Money::from_baht(300),
        disabled: false,
    };

    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([
            start(),
            WizardAction::MonthLoaded {
                month: this_month(),
                days: vec![slot_override(6, vec![afternoon_only])],
            },
            WizardAction::SelectDate { date: march(5) },
            WizardAction::SelectTimeslot { timeslot_id: 11 },
        ])
        .when_action(WizardAction::SelectDate { date: march(6) })
        .then_state(|state| {
            let selection = selection(state);
            assert_eq!(selection.booking_date, Some(march(6)));
            assert_eq!(selection.timeslot_id, None);
            assert_eq!(selection.adult_price, Money::ZERO);
            assert!(!state.can_proceed(WizardStep::DateTime));
        })
        .run();
}

#[test]
fn late_month_override_reprices_the_chosen_slot() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning())
        .when_action(WizardAction::MonthLoaded {
            month: this_month(),
            days: vec![slot_override(5, vec![morning_at(900)])],
        })
        .then_state(|state| {
            assert_eq!(selection(state).adult_price, Money::from_baht(900));
            assert!(state.availability.is_loaded(this_month()));
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn month_nobody_asked_for_is_ignored() {
    let april = this_month().next();

    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start()])
        .when_action(WizardAction::MonthLoaded {
            month: april,
            days: Vec::new(),
        })
        .then_state(move |state| {
            assert!(!state.availability.is_loaded(april));
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn failed_month_can_be_requested_again() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([
            start(),
            WizardAction::MonthFailed {
                month: this_month(),
                error: "bad gateway".to_string(),
            },
        ])
        .when_action(WizardAction::LoadMonth {
            month: this_month(),
        })
        .then_state(|state| {
            assert!(state.availability.is_loading(this_month()));
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn past_months_are_not_fetched() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start()])
        .when_action(WizardAction::LoadMonth {
            month: this_month().previous(),
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn guests_cannot_exceed_the_ticket_maximum() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning().into_iter().chain([
            WizardAction::IncrementAdults,
            WizardAction::IncrementChildren,
            WizardAction::IncrementChildren,
        ]))
        .when_action(WizardAction::IncrementAdults)
        .then_state(|state| {
            let selection = selection(state);
            assert_eq!((selection.adults, selection.children), (2, 2));
            assert_eq!(state.warning, Some(WizardWarning::MaxGuestsReached { max: 4 }));
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn adults_cannot_drop_below_the_minimum() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning())
        .when_action(WizardAction::DecrementAdults)
        .then_state(|state| {
            assert_eq!(selection(state).adults, 1);
            assert_eq!(state.warning, Some(WizardWarning::MinAdultsReached { min: 1 }));
        })
        .run();
}

#[test]
fn no_children_to_remove() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning())
        .when_action(WizardAction::DecrementChildren)
        .then_state(|state| {
            assert_eq!(state.warning, Some(WizardWarning::NoChildren));
        })
        .run();
}

#[test]
fn guests_need_a_timeslot() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start(), WizardAction::SelectDate { date: march(5) }])
        .when_action(WizardAction::IncrementAdults)
        .then_state(|state| {
            assert_eq!(state.warning, Some(WizardWarning::SelectTimeslotFirst));
            assert_eq!(selection(state).adults, 0);
        })
        .run();
}

#[test]
fn addon_quantity_is_capped_by_guests() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning())
        .when_action(WizardAction::SetAddonQuantity {
            addon_id: 100,
            quantity: 2,
        })
        .then_state(|state| {
            assert_eq!(state.warning, Some(WizardWarning::AddOnLimit { max: 1 }));
            assert_eq!(selection(state).addon(100).unwrap().quantity, 0);
        })
        .run();
}

#[test]
fn removing_guests_clamps_addons() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning().into_iter().chain([
            WizardAction::IncrementAdults,
            WizardAction::IncrementAdults,
            WizardAction::SetAddonQuantity {
                addon_id: 100,
                quantity: 3,
            },
        ]))
        .when_action(WizardAction::DecrementAdults)
        .then_state(|state| {
            let addon = selection(state).addon(100).unwrap();
            assert_eq!(addon.quantity, 2);
            assert!(addon.selected);
            assert_eq!(state.prices().unwrap().addon_total, Money::from_baht(200));
        })
        .run();
}

#[test]
fn toggling_an_addon_selects_one_unit_then_deselects() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning().into_iter().chain([WizardAction::ToggleAddon {
            addon_id: 100,
        }]))
        .when_action(WizardAction::ToggleAddon { addon_id: 100 })
        .then_state(|state| {
            let addon = selection(state).addon(100).unwrap();
            assert!(!addon.selected);
            assert_eq!(addon.quantity, 0);
        })
        .run();

    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning())
        .when_action(WizardAction::ToggleAddon { addon_id: 100 })
        .then_state(|state| {
            let addon = selection(state).addon(100).unwrap();
            assert!(addon.selected);
            assert_eq!(addon.quantity, 1);
        })
        .run();
}

#[test]
fn addon_of_another_ticket_is_unknown() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning())
        .when_action(WizardAction::ToggleAddon { addon_id: 101 })
        .then_state(|state| {
            assert_eq!(state.warning, Some(WizardWarning::UnknownAddOn));
        })
        .run();
}

#[test]
fn jumping_ahead_more_than_one_step_is_refused() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning())
        .when_action(WizardAction::JumpTo {
            step: WizardStep::Summary,
        })
        .then_state(|state| {
            assert_eq!(state.step, WizardStep::DateTime);
            assert_eq!(state.warning, Some(WizardWarning::StepUnreachable));
        })
        .run();
}

#[test]
fn jumping_back_is_always_allowed() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(
            booked_morning()
                .into_iter()
                .chain([WizardAction::Advance, WizardAction::Advance]),
        )
        .when_action(WizardAction::JumpTo {
            step: WizardStep::DateTime,
        })
        .then_state(|state| {
            assert_eq!(state.step, WizardStep::DateTime);
            assert_eq!(state.warning, None);
        })
        .run();
}

#[test]
fn retreat_from_first_step_stays_put() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start()])
        .when_action(WizardAction::Retreat)
        .then_state(|state| {
            assert_eq!(state.step, WizardStep::DateTime);
            assert_eq!(state.warning, None);
        })
        .run();
}

#[test]
fn checkout_only_from_summary() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning())
        .when_action(WizardAction::ProceedToCheckout)
        .then_state(|state| {
            assert_eq!(state.warning, Some(WizardWarning::NotOnSummary));
            assert!(!state.checkout_ready);
        })
        .run();
}

#[test]
fn summary_hands_draft_to_checkout() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(
            booked_morning()
                .into_iter()
                .chain([WizardAction::Advance, WizardAction::Advance]),
        )
        .when_action(WizardAction::ProceedToCheckout)
        .then_state(|state| {
            assert_eq!(state.step, WizardStep::Summary);
            assert!(state.checkout_ready);
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn back_to_tickets_drops_the_draft() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning())
        .when_action(WizardAction::BackToTickets)
        .then_state(|state| {
            assert_eq!(*state, WizardState::default());
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn next_user_action_replaces_the_warning() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([start(), WizardAction::Advance])
        .when_action(WizardAction::SelectDate { date: march(5) })
        .then_state(|state| {
            assert_eq!(state.warning, None);
        })
        .run();
}

#[test]
fn restore_forgets_a_date_that_has_passed() {
    let mut stale = BookingSelection::new(1, sample_ticket(), &sample_extras());
    stale.booking_date = Some(march(1));
    stale.apply_timeslot(&sample_ticket().time_slots[0]);
    stale.adults = 2;

    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .when_action(WizardAction::Restore { selection: stale })
        .then_state(|state| {
            let selection = selection(state);
            assert_eq!(selection.booking_date, None);
            assert_eq!(selection.timeslot_id, None);
            assert_eq!(selection.adults, 2);
            assert!(state.availability.is_loading(this_month()));
        })
        .run();
}

#[test]
fn date_closed_by_a_late_month_is_dropped() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning().into_iter().chain([WizardAction::Advance]))
        .when_action(WizardAction::MonthLoaded {
            month: this_month(),
            days: vec![closed(5)],
        })
        .then_state(|state| {
            let selection = selection(state);
            assert_eq!(selection.booking_date, None);
            assert_eq!(selection.timeslot_id, None);
            assert_eq!(selection.adult_price, Money::ZERO);
            assert_eq!(state.step, WizardStep::DateTime);
            assert_eq!(state.warning, Some(WizardWarning::DateUnavailable));
            assert!(!state.can_proceed(WizardStep::DateTime));
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn restored_draft_loses_a_date_closed_since() {
    let mut saved = BookingSelection::new(1, sample_ticket(), &sample_extras());
    saved.booking_date = Some(march(10));
    saved.apply_timeslot(&sample_ticket().time_slots[0]);

    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions([WizardAction::Restore { selection: saved }])
        .when_action(WizardAction::MonthLoaded {
            month: this_month(),
            days: vec![closed(10)],
        })
        .then_state(|state| {
            assert_eq!(selection(state).booking_date, None);
            assert_eq!(selection(state).timeslot_id, None);
            assert_eq!(state.warning, Some(WizardWarning::DateUnavailable));
        })
        .run();
}

#[test]
fn closed_draft_cannot_reach_checkout() {
    ReducerTest::new(WizardReducer::new())
        .with_env(environment())
        .given_state(WizardState::new())
        .given_actions(booked_morning().into_iter().chain([
            WizardAction::Advance,
            WizardAction::Advance,
            WizardAction::MonthLoaded {
                month: this_month(),
                days: vec![closed(5)],
            },
            WizardAction::JumpTo {
                step: WizardStep::Summary,
            },
        ]))
        .when_action(WizardAction::ProceedToCheckout)
        .then_state(|state| {
            assert!(!state.checkout_ready);
            assert_eq!(state.step, WizardStep::DateTime);
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[tokio::test]
async fn repriced_slot_is_patched_into_storage() {
    use coral_core::reducer::Reducer;

    let storage = SessionStorage::new(Arc::new(MemoryStorage::new()), Uuid::new_v4());
    let selection_store = Arc::new(SelectionStore::mount(storage).await);
    let env = WizardEnvironment::new(
        Arc::new(FakeBookingApi::new()),
        Arc::clone(&selection_store),
        Arc::new(FixedClock::on(march(3))),
    );
    let reducer = WizardReducer::new();
    let mut state = WizardState::new();
    for action in booked_morning() {
        drop(reducer.reduce(&mut state, action, &env));
    }
    selection_store.set(selection(&state).clone()).await;

    let mut effects = reducer
        .reduce(
            &mut state,
            WizardAction::MonthLoaded {
                month: this_month(),
                days: vec![slot_override(5, vec![morning_at(900)])],
            },
            &env,
        )
        .into_iter();
    let Some(Effect::Future(persisting)) = effects.next() else {
        unreachable!("a repriced slot is persisted");
    };
    assert!(persisting.await.is_none());

    let stored = selection_store.current().await.unwrap();
    assert_eq!(stored.adult_price, Money::from_baht(900));
    assert_eq!(stored.child_price, Money::from_baht(450));
    assert_eq!(stored.booking_date, Some(march(5)));
}

#[tokio::test]
async fn store_fetches_month_and_persists_draft() {
    let api = FakeBookingApi::new().with_availability(3, vec![closed(20)]);
    let storage = SessionStorage::new(Arc::new(MemoryStorage::new()), Uuid::new_v4());
    let selection_store = Arc::new(SelectionStore::mount(storage).await);
    let env = WizardEnvironment::new(
        Arc::new(api),
        Arc::clone(&selection_store),
        Arc::new(FixedClock::on(march(3))),
    );
    let store = WizardStore::new(WizardState::new(), WizardReducer::new(), env);

    let mut handle = store.send(start()).await.unwrap();
    handle.wait().await;

    assert!(store.state(|s| s.availability.is_blocked(march(20))).await);
    assert!(store.state(|s| s.availability.is_loaded(this_month())).await);
    let persisted = selection_store.current().await.unwrap();
    assert_eq!(persisted.ticket.id, 3);
}

mod properties {
    use super::*;
    use coral_core::reducer::Reducer;
    use proptest::prelude::*;

    fn user_action() -> impl Strategy<Value = WizardAction> {
        prop_oneof![
            Just(WizardAction::IncrementAdults),
            Just(WizardAction::DecrementAdults),
            Just(WizardAction::IncrementChildren),
            Just(WizardAction::DecrementChildren),
            (0u32..6).prop_map(|quantity| WizardAction::SetAddonQuantity {
                addon_id: 100,
                quantity,
            }),
            Just(WizardAction::ToggleAddon { addon_id: 100 }),
            Just(WizardAction::Advance),
            Just(WizardAction::Retreat),
            (11u64..14).prop_map(|timeslot_id| WizardAction::SelectTimeslot { timeslot_id }),
            (1u32..10).prop_map(|day| WizardAction::SelectDate { date: march(day) }),
        ]
    }

    proptest! {
        #[test]
        fn guest_and_addon_limits_hold(actions in proptest::collection::vec(user_action(), 0..40)) {
            let env = environment();
            let reducer = WizardReducer::new();
            let mut state = WizardState::new();
            for action in booked_morning().into_iter().chain(actions) {
                let _ = reducer.reduce(&mut state, action, &env);

                let selection = state.selection.as_ref().unwrap();
                let guests = selection.total_guests();
                prop_assert!(guests <= selection.ticket.max_guest);
                prop_assert!(selection.booking_date.is_none_or(|date| date >= march(3)));
                for addon in &selection.addons {
                    prop_assert!(addon.quantity <= guests);
                    prop_assert_eq!(addon.selected, addon.quantity > 0);
                }
                if selection.timeslot_id.is_some() {
                    prop_assert!(selection.adults >= selection.ticket.min_guest);
                }
            }
        }
    }
}
