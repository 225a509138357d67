use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeSet;

use crate::models::appointment::Appointment;
use crate::models::availability::{BookedSlots, WorkingSlots};
use crate::models::resource::SlotType;

/// Start times taken on `date` by active appointments.
pub fn booked_times(appointments: &[Appointment], date: NaiveDate) -> BTreeSet<NaiveTime> {
    appointments
        .iter()
        .filter(|a| a.is_active() && a.date == date)
        .filter_map(|a| a.time)
        .collect()
}

/// Days covered by active appointments.
pub fn booked_days(appointments: &[Appointment]) -> BTreeSet<NaiveDate> {
    appointments
        .iter()
        .filter(|a| a.is_active())
        .flat_map(|a| a.days())
        .collect()
}

/// Whether no active appointment touches `[start, end]`.
pub fn period_is_free(appointments: &[Appointment], start: NaiveDate, end: NaiveDate) -> bool {
    !appointments
        .iter()
        .any(|a| a.is_active() && a.overlaps(start, end))
}

/// Candidates minus what is already booked on `date`.
pub fn available_slots(
    candidates: WorkingSlots,
    date: NaiveDate,
    appointments: &[Appointment],
) -> WorkingSlots {
    match candidates {
        WorkingSlots::Times(slots) => {
            let taken = booked_times(appointments, date);
            WorkingSlots::Times(
                slots
                    .into_iter()
                    .filter(|s| !taken.contains(&s.time))
                    .collect(),
            )
        }
        WorkingSlots::FullDay => {
            if period_is_free(appointments, date, date) {
                WorkingSlots::FullDay
            } else {
                WorkingSlots::Closed
            }
        }
        WorkingSlots::Closed => WorkingSlots::Closed,
    }
}

/// What is occupied on `date`, in the modality's granularity.
pub fn booked_slots(slot_type: SlotType, date: NaiveDate, appointments: &[Appointment]) -> BookedSlots {
    match slot_type {
        SlotType::Minutes => BookedSlots::Times(booked_times(appointments, date)),
        SlotType::Days => {
            if period_is_free(appointments, date, date) {
                BookedSlots::FullDayAvailable
            } else {
                BookedSlots::FullDayBooked
            }
        }
    }
}
