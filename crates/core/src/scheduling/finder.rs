use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use std::collections::BTreeSet;

use super::{availability, rules, shifts, slots};
use crate::config::SchedulingConfig;
use crate::models::appointment::Appointment;
use crate::models::availability::{NextAvailability, PeriodLabel, WorkingSlots};
use crate::models::resource::{Resource, SlotType};
use crate::models::shift::ShiftDefinition;

/// Parameters of a forward search.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub from: NaiveDate,
    /// Number of days to examine, starting at the first searchable day.
    pub range_limit: Option<u32>,
    /// Only look for periods of exactly this length (days mode).
    pub duration_days: Option<u32>,
    /// Days already offered to someone else through a cancellation.
    pub excluded_dates: BTreeSet<NaiveDate>,
}

/// Everything the search reads, loaded up front.
pub struct SearchContext<'a> {
    pub resource: &'a Resource,
    /// All active shift definitions of the modality.
    pub definitions: &'a [ShiftDefinition],
    /// Active appointments over the searched window.
    pub appointments: &'a [Appointment],
    pub now: NaiveDateTime,
    pub config: &'a SchedulingConfig,
}

impl SearchRequest {
    /// Days to examine. A `range_limit` never exceeds the configured horizon.
    pub fn horizon(&self, config: &SchedulingConfig) -> u32 {
        let max = config.search_horizon_days.max(1);
        self.range_limit.unwrap_or(max).clamp(1, max)
    }

    /// First day the search looks at: `from`, or today if `from` is past.
    pub fn first_day(&self, today: NaiveDate) -> NaiveDate {
        self.from.max(today)
    }

    /// Last day the search may touch, including the tail of a period that
    /// starts on the final candidate date.
    pub fn window_end(&self, today: NaiveDate, config: &SchedulingConfig) -> NaiveDate {
        let span = u64::from(self.horizon(config)) + u64::from(rules::THURSDAY_MAX_DAYS);
        self.first_day(today)
            .checked_add_days(Days::new(span))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// First date on or after `request.from` (and today) with an opening, or
/// `None` once the horizon is exhausted. Fridays are never returned.
pub fn find_next(ctx: &SearchContext<'_>, request: &SearchRequest) -> Option<NextAvailability> {
    let first = request.first_day(ctx.now.date());
    let horizon = usize::try_from(request.horizon(ctx.config)).unwrap_or(usize::MAX);

    first
        .iter_days()
        .take(horizon)
        .filter(|day| day.weekday() != Weekday::Fri)
        .find_map(|day| match ctx.resource.slot_type {
            SlotType::Minutes => minutes_opening(ctx, request, day),
            SlotType::Days => days_opening(ctx, request, day),
        })
}

fn minutes_opening(
    ctx: &SearchContext<'_>,
    request: &SearchRequest,
    day: NaiveDate,
) -> Option<NextAvailability> {
    if request.excluded_dates.contains(&day) {
        return None;
    }
    let day_shifts = shifts::resolve(ctx.resource, day, ctx.definitions);
    let candidates = slots::generate(ctx.resource, day, &day_shifts, ctx.now, ctx.config);
    match availability::available_slots(candidates, day, ctx.appointments) {
        WorkingSlots::Times(free) if !free.is_empty() => Some(NextAvailability {
            date: day,
            period: free[0].period.into(),
            slots: free.iter().map(|s| s.time).collect(),
            durations: Vec::new(),
        }),
        _ => None,
    }
}

fn days_opening(
    ctx: &SearchContext<'_>,
    request: &SearchRequest,
    day: NaiveDate,
) -> Option<NextAvailability> {
    let today = ctx.now.date();
    let candidates = match request.duration_days {
        Some(requested) => vec![requested],
        None => rules::allowed_durations(ctx.resource, day),
    };

    let durations: Vec<u32> = candidates
        .into_iter()
        .filter(|&length| {
            let Ok(length) =
                rules::validate_period(ctx.resource, day, Some(length), today, ctx.config)
            else {
                return false;
            };
            let Ok(end) = rules::period_end(day, length) else {
                return false;
            };
            let touches_excluded = request.excluded_dates.range(day..=end).next().is_some();
            !touches_excluded && availability::period_is_free(ctx.appointments, day, end)
        })
        .collect();

    if durations.is_empty() {
        return None;
    }
    let period = if durations.iter().any(|d| *d > 1) {
        PeriodLabel::MultiDay
    } else {
        PeriodLabel::FullDay
    };
    Some(NextAvailability {
        date: day,
        period,
        slots: Vec::new(),
        durations,
    })
}
