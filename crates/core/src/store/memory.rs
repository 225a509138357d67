use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Claim, CommitOutcome, SchedulingStore, SlotTypeChange, StatusChange};
use crate::filters::{AppointmentFilter, ShiftFilter};
use crate::models::appointment::{Appointment, AppointmentStatus, RESCHEDULABLE_STATUSES};
use crate::models::force_override::ForceOverride;
use crate::models::resource::{Resource, SlotType};
use crate::models::shift::ShiftDefinition;

#[derive(Debug, Default)]
struct MemoryState {
    resources: HashMap<Uuid, Resource>,
    shifts: Vec<ShiftDefinition>,
    force_overrides: Vec<ForceOverride>,
    appointments: HashMap<Uuid, Appointment>,
}

impl MemoryState {
    fn has_conflict(&self, appointment: &Appointment, ignore: Option<Uuid>) -> bool {
        let claim = Claim::of(appointment);
        self.appointments.values().any(|existing| {
            existing.resource_id == appointment.resource_id
                && Some(existing.id) != ignore
                && existing.is_active()
                && claim.conflicts_with(existing)
        })
    }

    fn slot_type_matches(&self, appointment: &Appointment) -> bool {
        self.resources
            .get(&appointment.resource_id)
            .is_some_and(|r| r.slot_type == Claim::of(appointment).slot_type())
    }

    fn live_mut(&mut self, id: Uuid) -> Option<&mut Appointment> {
        self.appointments
            .get_mut(&id)
            .filter(|a| a.deleted_at.is_none())
    }
}

/// `SchedulingStore` kept in process memory.
///
/// Every write takes the single write lock, so the conflict re-check and the
/// insert happen as one step.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_resource(&self, resource: Resource) {
        self.state.write().await.resources.insert(resource.id, resource);
    }

    pub async fn add_shift(&self, shift: ShiftDefinition) {
        self.state.write().await.shifts.push(shift);
    }

    pub async fn add_force_override(&self, force_override: ForceOverride) {
        self.state.write().await.force_overrides.push(force_override);
    }

    /// Seed a row as-is, bypassing conflict checks.
    pub async fn add_appointment(&self, appointment: Appointment) {
        self.state
            .write()
            .await
            .appointments
            .insert(appointment.id, appointment);
    }

    pub async fn all_appointments(&self) -> Vec<Appointment> {
        let state = self.state.read().await;
        let mut rows: Vec<Appointment> = state.appointments.values().cloned().collect();
        rows.sort_by_key(|a| (a.date, a.time, a.created_at));
        rows
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn get_resource(&self, id: Uuid) -> Result<Option<Resource>> {
        Ok(self.state.read().await.resources.get(&id).cloned())
    }

    async fn change_slot_type(&self, id: Uuid, slot_type: SlotType) -> Result<SlotTypeChange> {
        let mut state = self.state.write().await;
        let has_live = state
            .appointments
            .values()
            .any(|a| a.resource_id == id && a.deleted_at.is_none());
        let Some(resource) = state.resources.get_mut(&id) else {
            return Ok(SlotTypeChange::Missing);
        };
        if resource.slot_type == slot_type {
            return Ok(SlotTypeChange::Changed(resource.clone()));
        }
        if has_live {
            return Ok(SlotTypeChange::Locked);
        }
        resource.slot_type = slot_type;
        Ok(SlotTypeChange::Changed(resource.clone()))
    }

    async fn list_shift_definitions(&self, filter: &ShiftFilter) -> Result<Vec<ShiftDefinition>> {
        let state = self.state.read().await;
        Ok(state
            .shifts
            .iter()
            .filter(|def| filter.matches(def))
            .cloned()
            .collect())
    }

    async fn get_force_override(
        &self,
        resource_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ForceOverride>> {
        let state = self.state.read().await;
        Ok(state
            .force_overrides
            .iter()
            .find(|f| f.resource_id == resource_id && f.user_id == user_id)
            .cloned())
    }

    async fn find_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
        let state = self.state.read().await;
        let mut rows: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.date, a.time, a.created_at));
        Ok(rows)
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.state.read().await.appointments.get(&id).cloned())
    }

    async fn insert_appointment(
        &self,
        appointment: Appointment,
        retire: Option<Uuid>,
    ) -> Result<CommitOutcome> {
        let mut state = self.state.write().await;
        if !state.slot_type_matches(&appointment) || state.has_conflict(&appointment, retire) {
            return Ok(CommitOutcome::Conflict);
        }
        if let Some(id) = retire {
            let Some(retired) = state
                .live_mut(id)
                .filter(|a| a.status == AppointmentStatus::Canceled)
            else {
                return Ok(CommitOutcome::Stale);
            };
            retired.deleted_at = Some(appointment.created_at);
            retired.updated_at = appointment.created_at;
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(CommitOutcome::Committed(appointment))
    }

    async fn reschedule_appointment(&self, appointment: Appointment) -> Result<CommitOutcome> {
        let mut state = self.state.write().await;
        let movable = state
            .appointments
            .get(&appointment.id)
            .is_some_and(|a| a.deleted_at.is_none() && RESCHEDULABLE_STATUSES.contains(&a.status));
        if !movable {
            return Ok(CommitOutcome::Stale);
        }
        if !state.slot_type_matches(&appointment)
            || state.has_conflict(&appointment, Some(appointment.id))
        {
            return Ok(CommitOutcome::Conflict);
        }
        let Some(stored) = state.live_mut(appointment.id) else {
            return Ok(CommitOutcome::Stale);
        };
        stored.date = appointment.date;
        stored.time = appointment.time;
        stored.end_date = appointment.end_date;
        stored.duration_days = appointment.duration_days;
        stored.updated_by = appointment.updated_by;
        stored.updated_at = appointment.updated_at;
        Ok(CommitOutcome::Committed(stored.clone()))
    }

    async fn update_status(&self, change: &StatusChange) -> Result<Option<Appointment>> {
        let mut state = self.state.write().await;
        Ok(state
            .live_mut(change.id)
            .filter(|a| a.status == change.expected)
            .map(|stored| {
                change.apply(stored);
                stored.clone()
            }))
    }

    async fn remove_appointment(
        &self,
        id: Uuid,
        removed_by: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Appointment>> {
        let mut state = self.state.write().await;
        Ok(state.live_mut(id).map(|stored| {
            stored.deleted_at = Some(at);
            stored.updated_by = Some(removed_by);
            stored.updated_at = at;
            stored.clone()
        }))
    }
}
