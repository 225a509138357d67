use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::shift::ShiftPeriod;

/// A bookable start time in minutes mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub time: NaiveTime,
    pub period: ShiftPeriod,
}

/// Candidate slots for one date, before or after booked ones are removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "slots", rename_all = "snake_case")]
pub enum WorkingSlots {
    /// Minutes mode. Ordered, no duplicate times.
    Times(Vec<Slot>),
    /// Days mode: the whole day is open.
    FullDay,
    /// Days mode: the date is not bookable.
    Closed,
}

impl WorkingSlots {
    pub fn times(&self) -> Vec<NaiveTime> {
        match self {
            WorkingSlots::Times(slots) => slots.iter().map(|s| s.time).collect(),
            WorkingSlots::FullDay | WorkingSlots::Closed => Vec::new(),
        }
    }
}

/// What is already taken on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "times", rename_all = "snake_case")]
pub enum BookedSlots {
    Times(BTreeSet<NaiveTime>),
    FullDayBooked,
    FullDayAvailable,
}

/// Label describing what the next opening is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodLabel {
    Morning,
    Afternoon,
    FullDay,
    MultiDay,
}

impl From<ShiftPeriod> for PeriodLabel {
    fn from(period: ShiftPeriod) -> Self {
        match period {
            ShiftPeriod::Morning => PeriodLabel::Morning,
            ShiftPeriod::Afternoon => PeriodLabel::Afternoon,
        }
    }
}

/// First opening found by a forward search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextAvailability {
    pub date: NaiveDate,
    pub period: PeriodLabel,
    /// Free start times (minutes mode).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<NaiveTime>,
    /// Feasible period lengths (days mode).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub durations: Vec<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckAvailabilityQuery {
    pub date: Option<NaiveDate>,
    pub days_from_now: Option<u32>,
    pub duration_days: Option<u32>,
    pub range_limit: Option<u32>,
    /// Dates already offered through cancellation rebooking.
    #[serde(default)]
    pub excluded_dates: BTreeSet<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckAvailabilityResponse {
    pub next_available: Option<NextAvailability>,
}
