//! Calendar availability cache.
//!
//! Availability is fetched one calendar month at a time and merged into a
//! per-date map. Open dates collect in `available`, closed ones in
//! `blocked`. A date's ticket-type entry overrides the ticket's default time
//! slots (prices and disabled flags) for that date.

use chrono::{Datelike, Months, NaiveDate};
use coral_api::{AvailabilityDay, TicketTypeAvailability, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Month containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month from year and 1-based month number.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self::containing)
    }

    /// First day.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day.
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }

    /// Following month.
    #[must_use]
    pub fn next(self) -> Self {
        self.first_day()
            .checked_add_months(Months::new(1))
            .map_or(self, Self::containing)
    }

    /// Preceding month.
    #[must_use]
    pub fn previous(self) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(1))
            .map_or(self, Self::containing)
    }

    /// Every date of the month.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day().iter_days().take_while(move |day| *day <= last)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Error for strings that are not `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month {0:?}, expected YYYY-MM")]
pub struct InvalidMonth(pub String);

impl FromStr for Month {
    type Err = InvalidMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

/// Cached availability of one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAvailability {
    /// Open for booking
    pub active: bool,
    /// Per-ticket slot overrides
    pub ticket_types: Vec<TicketTypeAvailability>,
}

/// Availability of one ticket across the months viewed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityCache {
    days: BTreeMap<NaiveDate, DayAvailability>,
    available: BTreeSet<NaiveDate>,
    blocked: BTreeSet<NaiveDate>,
    loaded: BTreeSet<Month>,
    loading: BTreeSet<Month>,
}

impl AvailabilityCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a fetched month.
    pub fn merge_month(&mut self, month: Month, days: Vec<AvailabilityDay>) {
        for day in days {
            let active = day.is_active();
            if active {
                self.available.insert(day.date);
            } else {
                self.available.remove(&day.date);
                self.blocked.insert(day.date);
            }
            self.days.insert(
                day.date,
                DayAvailability {
                    active,
                    ticket_types: day.ticket_types,
                },
            );
        }
        self.loading.remove(&month);
        self.loaded.insert(month);
    }

    /// Mark a month as in flight; returns `false` if it is loaded or in flight.
    pub fn begin_loading(&mut self, month: Month) -> bool {
        if self.loaded.contains(&month) || self.loading.contains(&month) {
            return false;
        }
        self.loading.insert(month)
    }

    /// Forget an in-flight month after a failed fetch so it can be retried.
    pub fn abandon_loading(&mut self, month: Month) {
        self.loading.remove(&month);
    }

    /// Whether a fetch of the month is in flight.
    #[must_use]
    pub fn is_loading(&self, month: Month) -> bool {
        self.loading.contains(&month)
    }

    /// Whether the month has been merged.
    #[must_use]
    pub fn is_loaded(&self, month: Month) -> bool {
        self.loaded.contains(&month)
    }

    /// Whether the date is known to be closed.
    #[must_use]
    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.blocked.contains(&date)
    }

    /// Whether the date is known to be open.
    #[must_use]
    pub fn is_available(&self, date: NaiveDate) -> bool {
        self.available.contains(&date)
    }

    /// Cached entry of a date.
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&DayAvailability> {
        self.days.get(&date)
    }

    /// Date-specific slots of a ticket, if the date overrides them.
    #[must_use]
    pub fn slots_for(&self, ticket_id: u64, date: NaiveDate) -> Option<&[TimeSlot]> {
        self.days
            .get(&date)?
            .ticket_types
            .iter()
            .find(|entry| entry.ticket_id == ticket_id)
            .map(|entry| entry.time_slots.as_slice())
    }

    /// Slots offered for a ticket on a date: the override when cached,
    /// otherwise `defaults`.
    #[must_use]
    pub fn effective_slots<'a>(
        &'a self,
        ticket_id: u64,
        date: NaiveDate,
        defaults: &'a [TimeSlot],
    ) -> &'a [TimeSlot] {
        self.slots_for(ticket_id, date).unwrap_or(defaults)
    }
}
