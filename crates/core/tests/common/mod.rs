#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc, Weekday};
use modsched_core::clock::FixedClock;
use modsched_core::config::SchedulingConfig;
use modsched_core::models::appointment::{Actor, BookAppointmentRequest};
use modsched_core::models::force_override::ForceOverride;
use modsched_core::models::resource::{Resource, SlotType};
use modsched_core::models::shift::{ShiftDefinition, ShiftPeriod};
use modsched_core::scheduler::Scheduler;
use modsched_core::store::memory::InMemoryStore;
use uuid::Uuid;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").expect("valid time")
}

pub fn staff() -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        is_admin: false,
    }
}

pub fn admin() -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        is_admin: true,
    }
}

/// Scheduler over an in-memory store with the clock frozen at
/// Saturday 2024-06-01 08:00.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub scheduler: Arc<Scheduler>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SchedulingConfig::default())
    }

    pub fn with_config(config: SchedulingConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock(date("2024-06-01").and_time(time("08:00"))));
        let scheduler = Arc::new(Scheduler::new(store.clone(), clock, config));
        Self { store, scheduler }
    }

    pub async fn minutes_modality(&self, slot_minutes: Option<u32>) -> Resource {
        let resource = Resource {
            id: Uuid::new_v4(),
            name: "MRI 1".to_string(),
            slot_type: SlotType::Minutes,
            slot_duration_minutes: slot_minutes,
            max_bookable_days: None,
            is_active: true,
            created_at: Utc::now(),
        };
        self.store.add_resource(resource.clone()).await;
        resource
    }

    pub async fn days_modality(&self, max_days: u32) -> Resource {
        let resource = Resource {
            id: Uuid::new_v4(),
            name: "Ambulatory BP Monitor".to_string(),
            slot_type: SlotType::Days,
            slot_duration_minutes: None,
            max_bookable_days: Some(max_days),
            is_active: true,
            created_at: Utc::now(),
        };
        self.store.add_resource(resource.clone()).await;
        resource
    }

    pub async fn weekly_shift(
        &self,
        resource: &Resource,
        day: Weekday,
        period: ShiftPeriod,
        start: &str,
        end: &str,
    ) {
        self.store
            .add_shift(ShiftDefinition {
                id: Uuid::new_v4(),
                resource_id: resource.id,
                day_of_week: Some(day),
                date: None,
                shift_period: period,
                start_time: time(start),
                end_time: time(end),
                patients_per_shift: None,
                is_active: true,
            })
            .await;
    }

    pub async fn grant_force(
        &self,
        resource: &Resource,
        actor: &Actor,
        window: Option<(&str, &str)>,
    ) {
        self.store
            .add_force_override(ForceOverride {
                id: Uuid::new_v4(),
                resource_id: resource.id,
                user_id: actor.user_id,
                is_able_to_force: true,
                start_time: window.map(|(start, _)| time(start)),
                end_time: window.map(|(_, end)| time(end)),
                number_of_patients: None,
            })
            .await;
    }
}

pub fn slot_request(resource: &Resource, day: &str, at: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        modality_id: resource.id,
        patient_id: Uuid::new_v4(),
        date: date(day),
        time: Some(time(at)),
        duration_days: None,
        rebook_canceled: false,
        force: false,
        reason: None,
        follow_up_of: None,
    }
}

pub fn period_request(resource: &Resource, day: &str, duration_days: u32) -> BookAppointmentRequest {
    BookAppointmentRequest {
        modality_id: resource.id,
        patient_id: Uuid::new_v4(),
        date: date(day),
        time: None,
        duration_days: Some(duration_days),
        rebook_canceled: false,
        force: false,
        reason: None,
        follow_up_of: None,
    }
}
