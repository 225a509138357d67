use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

use super::rules;
use crate::config::SchedulingConfig;
use crate::models::availability::{Slot, WorkingSlots};
use crate::models::resource::{Resource, SlotType};
use crate::models::shift::{ShiftDefinition, ShiftPeriod};

/// Slot length for a day's shifts, in minutes.
///
/// The modality's fixed duration wins. Otherwise the day's total shift time
/// is split evenly between its patients, and failing that the configured
/// default applies.
pub fn slot_duration(
    resource: &Resource,
    shifts: &[ShiftDefinition],
    config: &SchedulingConfig,
) -> i64 {
    if let Some(fixed) = resource.slot_duration_minutes.filter(|m| *m > 0) {
        return i64::from(fixed);
    }
    let total_minutes: i64 = shifts.iter().map(ShiftDefinition::duration_minutes).sum();
    let total_patients: i64 = shifts
        .iter()
        .map(|s| i64::from(s.patients_per_shift.unwrap_or(0)))
        .sum();
    if total_patients > 0 && total_minutes >= total_patients {
        total_minutes / total_patients
    } else {
        i64::from(config.default_slot_minutes.max(1))
    }
}

/// Start times inside one shift.
pub fn shift_slots(shift: &ShiftDefinition, duration_minutes: i64) -> Vec<NaiveTime> {
    let shift_minutes = shift.duration_minutes();
    if shift_minutes == 0 {
        return Vec::new();
    }
    if shift.patients_per_shift == Some(1) {
        return vec![shift.start_time];
    }

    let step = duration_minutes.max(1);
    let count = shift_minutes / step;
    let mut slots = Vec::with_capacity(count as usize);
    for i in 0..count {
        let (start, wrapped) = shift
            .start_time
            .overflowing_add_signed(Duration::minutes(i * step));
        if wrapped != 0 || start >= shift.end_time {
            break;
        }
        slots.push(start);
    }
    slots
}

/// Candidate minutes-mode slots, ordered by time with duplicates collapsed.
///
/// Slots that start at or before `now + booking_lead_minutes` are dropped, so
/// nothing in the past or about to begin is offered.
pub fn generate_minutes(
    resource: &Resource,
    date: NaiveDate,
    shifts: &[ShiftDefinition],
    now: NaiveDateTime,
    config: &SchedulingConfig,
) -> Vec<Slot> {
    let duration = slot_duration(resource, shifts, config);
    let cutoff = now + Duration::minutes(config.booking_lead_minutes);

    let mut by_time: BTreeMap<NaiveTime, ShiftPeriod> = BTreeMap::new();
    for shift in shifts {
        for time in shift_slots(shift, duration) {
            if date.and_time(time) > cutoff {
                by_time.entry(time).or_insert(shift.shift_period);
            }
        }
    }

    by_time
        .into_iter()
        .map(|(time, period)| Slot { time, period })
        .collect()
}

/// Candidates for `date`: discrete slots in minutes mode, a whole-day marker
/// in days mode.
pub fn generate(
    resource: &Resource,
    date: NaiveDate,
    shifts: &[ShiftDefinition],
    now: NaiveDateTime,
    config: &SchedulingConfig,
) -> WorkingSlots {
    match resource.slot_type {
        SlotType::Minutes => {
            WorkingSlots::Times(generate_minutes(resource, date, shifts, now, config))
        }
        SlotType::Days => {
            if resource.is_active && rules::is_date_open(date, now.date(), config) {
                WorkingSlots::FullDay
            } else {
                WorkingSlots::Closed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, date, days_resource, minutes_resource, shift, time};
    use chrono::Weekday;
    use pretty_assertions::assert_eq;

    fn times(slots: &[Slot]) -> Vec<String> {
        slots.iter().map(|s| s.time.format("%H:%M").to_string()).collect()
    }

    #[test]
    fn fixed_duration_fills_the_shift() {
        let resource = minutes_resource(Some(20));
        let shifts = vec![shift(&resource, Weekday::Mon, ShiftPeriod::Morning, "08:00", "12:00")];
        let config = SchedulingConfig::default();

        let slots = generate_minutes(&resource, date("2024-06-10"), &shifts, at("2024-06-01", "08:00"), &config);

        assert_eq!(slots.len(), 12);
        assert_eq!(slots[0].time, time("08:00"));
        assert_eq!(slots[11].time, time("11:40"));
        assert!(slots.windows(2).all(|w| w[1].time - w[0].time == Duration::minutes(20)));
    }

    #[test]
    fn today_suppresses_slots_within_the_lead_time() {
        let resource = minutes_resource(Some(20));
        let shifts = vec![shift(&resource, Weekday::Mon, ShiftPeriod::Morning, "08:00", "12:00")];
        let config = SchedulingConfig::default();

        // 09:35 + 5 minutes = 09:40, which is itself excluded.
        let slots = generate_minutes(&resource, date("2024-06-10"), &shifts, at("2024-06-10", "09:35"), &config);

        assert_eq!(times(&slots)[0], "10:00");
        assert!(slots.iter().all(|s| s.time > time("09:40")));
    }

    #[test]
    fn past_dates_have_no_slots() {
        let resource = minutes_resource(Some(30));
        let shifts = vec![shift(&resource, Weekday::Mon, ShiftPeriod::Morning, "09:00", "11:00")];
        let slots = generate_minutes(
            &resource,
            date("2024-06-10"),
            &shifts,
            at("2024-06-11", "07:00"),
            &SchedulingConfig::default(),
        );
        assert!(slots.is_empty());
    }

    #[test]
    fn duration_is_derived_from_patient_counts() {
        let resource = minutes_resource(None);
        let mut morning = shift(&resource, Weekday::Mon, ShiftPeriod::Morning, "08:00", "10:00");
        morning.patients_per_shift = Some(3);
        let mut afternoon = shift(&resource, Weekday::Mon, ShiftPeriod::Afternoon, "13:00", "14:00");
        afternoon.patients_per_shift = Some(1);
        let shifts = vec![morning, afternoon];
        let config = SchedulingConfig::default();

        // 180 minutes across 4 patients.
        assert_eq!(slot_duration(&resource, &shifts, &config), 45);

        let slots = generate_minutes(&resource, date("2024-06-10"), &shifts, at("2024-06-01", "08:00"), &config);
        assert_eq!(times(&slots), vec!["08:00", "08:45", "13:00"]);
        assert_eq!(slots[2].period, ShiftPeriod::Afternoon);
    }

    #[test]
    fn zero_patients_fall_back_to_default_duration() {
        let resource = minutes_resource(None);
        let shifts = vec![shift(&resource, Weekday::Mon, ShiftPeriod::Morning, "09:00", "10:00")];
        let config = SchedulingConfig::default();
        assert_eq!(slot_duration(&resource, &shifts, &config), 30);
    }

    #[test]
    fn overlapping_shifts_collapse_duplicate_times() {
        let resource = minutes_resource(Some(30));
        let shifts = vec![
            shift(&resource, Weekday::Mon, ShiftPeriod::Morning, "09:00", "11:00"),
            shift(&resource, Weekday::Mon, ShiftPeriod::Afternoon, "10:00", "12:00"),
        ];
        let slots = generate_minutes(
            &resource,
            date("2024-06-10"),
            &shifts,
            at("2024-06-01", "08:00"),
            &SchedulingConfig::default(),
        );
        assert_eq!(
            times(&slots),
            vec!["09:00", "09:30", "10:00", "10:30", "11:00", "11:30"]
        );
        assert_eq!(slots[2].period, ShiftPeriod::Morning);
    }

    #[test]
    fn days_mode_yields_a_whole_day_marker() {
        let resource = days_resource(3);
        let config = SchedulingConfig::default();
        let now = at("2024-06-01", "08:00");

        assert_eq!(generate(&resource, date("2024-06-13"), &[], now, &config), WorkingSlots::FullDay);
        assert_eq!(generate(&resource, date("2024-06-14"), &[], now, &config), WorkingSlots::Closed);
        assert_eq!(generate(&resource, date("2024-05-30"), &[], now, &config), WorkingSlots::Closed);
    }
}
