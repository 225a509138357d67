//! Postgres implementation of [`SchedulingStore`].
//!
//! Writes that claim a slot or a day range run in one transaction that first
//! locks the modality row with `SELECT ... FOR UPDATE`, re-reads the
//! conflicting appointments and only then inserts. Concurrent bookings on the
//! same modality therefore queue behind each other, and the partial unique
//! index on active minutes-mode slots backs this up.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{Result, eyre};
use tracing::{debug, warn};
use uuid::Uuid;

use modsched_core::filters::{AppointmentFilter, ShiftFilter};
use modsched_core::models::appointment::{Appointment, RESCHEDULABLE_STATUSES};
use modsched_core::models::force_override::ForceOverride;
use modsched_core::models::resource::{Resource, SlotType};
use modsched_core::models::shift::ShiftDefinition;
use modsched_core::store::{Claim, CommitOutcome, SchedulingStore, SlotTypeChange, StatusChange};

use crate::DbPool;
use crate::models::DbAppointment;
use crate::repositories::{appointment, force_override, modality, shift};

fn into_appointments(rows: Vec<DbAppointment>) -> Result<Vec<Appointment>> {
    rows.into_iter().map(Appointment::try_from).collect()
}

fn is_unique_violation(err: &eyre::Report) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => db.is_unique_violation(),
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct PgSchedulingStore {
    pool: DbPool,
}

impl PgSchedulingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl SchedulingStore for PgSchedulingStore {
    async fn get_resource(&self, id: Uuid) -> Result<Option<Resource>> {
        modality::get_modality_by_id(&self.pool, id)
            .await?
            .map(Resource::try_from)
            .transpose()
    }

    async fn change_slot_type(&self, id: Uuid, slot_type: SlotType) -> Result<SlotTypeChange> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = modality::lock_modality(&mut *tx, id).await? else {
            tx.rollback().await?;
            return Ok(SlotTypeChange::Missing);
        };
        if current != slot_type.as_str() && modality::has_live_appointments(&mut *tx, id).await? {
            tx.rollback().await?;
            return Ok(SlotTypeChange::Locked);
        }

        let row = modality::update_slot_type(&mut *tx, id, slot_type.as_str())
            .await?
            .ok_or_else(|| eyre!("modality {} vanished while locked", id))?;
        tx.commit().await?;
        Ok(SlotTypeChange::Changed(Resource::try_from(row)?))
    }

    async fn list_shift_definitions(&self, filter: &ShiftFilter) -> Result<Vec<ShiftDefinition>> {
        shift::get_schedules_for_modality(&self.pool, filter.resource_id, filter.date)
            .await?
            .into_iter()
            .map(ShiftDefinition::try_from)
            .collect()
    }

    async fn get_force_override(
        &self,
        resource_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ForceOverride>> {
        force_override::get_force_override(&self.pool, resource_id, user_id)
            .await?
            .map(ForceOverride::try_from)
            .transpose()
    }

    async fn find_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
        into_appointments(appointment::find_appointments(&self.pool, filter).await?)
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        appointment::get_appointment_by_id(&self.pool, id)
            .await?
            .map(Appointment::try_from)
            .transpose()
    }

    async fn insert_appointment(
        &self,
        new: Appointment,
        retire: Option<Uuid>,
    ) -> Result<CommitOutcome> {
        let mut tx = self.pool.begin().await?;

        let slot_type = modality::lock_modality(&mut *tx, new.resource_id)
            .await?
            .ok_or_else(|| eyre!("modality {} does not exist", new.resource_id))?;
        let claim = Claim::of(&new);
        if slot_type != claim.slot_type().as_str() {
            debug!("Modality {} switched to {} mode", new.resource_id, slot_type);
            tx.rollback().await?;
            return Ok(CommitOutcome::Conflict);
        }

        let filter =
            AppointmentFilter::active(new.resource_id, new.date, new.last_day()).excluding(retire);
        let existing = into_appointments(appointment::find_appointments(&mut *tx, &filter).await?)?;
        if existing.iter().any(|row| claim.conflicts_with(row)) {
            debug!("Conflict re-check rejected appointment {}", new.id);
            tx.rollback().await?;
            return Ok(CommitOutcome::Conflict);
        }

        if let Some(retired) = retire {
            let retired_rows =
                appointment::retire_canceled_appointment(&mut *tx, retired, new.created_at).await?;
            if retired_rows != 1 {
                debug!("Canceled appointment {} was already rebooked", retired);
                tx.rollback().await?;
                return Ok(CommitOutcome::Stale);
            }
        }

        let row = match appointment::insert_appointment(&mut *tx, &new).await {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => {
                warn!("Unique slot index rejected appointment {}", new.id);
                tx.rollback().await?;
                return Ok(CommitOutcome::Conflict);
            }
            Err(err) => return Err(err),
        };

        tx.commit().await?;
        Ok(CommitOutcome::Committed(Appointment::try_from(row)?))
    }

    async fn reschedule_appointment(&self, moved: Appointment) -> Result<CommitOutcome> {
        let mut tx = self.pool.begin().await?;

        let slot_type = modality::lock_modality(&mut *tx, moved.resource_id)
            .await?
            .ok_or_else(|| eyre!("modality {} does not exist", moved.resource_id))?;
        let claim = Claim::of(&moved);
        if slot_type != claim.slot_type().as_str() {
            tx.rollback().await?;
            return Ok(CommitOutcome::Conflict);
        }

        let filter = AppointmentFilter::active(moved.resource_id, moved.date, moved.last_day())
            .excluding(Some(moved.id));
        let existing = into_appointments(appointment::find_appointments(&mut *tx, &filter).await?)?;
        if existing.iter().any(|row| claim.conflicts_with(row)) {
            tx.rollback().await?;
            return Ok(CommitOutcome::Conflict);
        }

        let row = match appointment::reschedule_appointment(&mut *tx, &moved, RESCHEDULABLE_STATUSES)
            .await
        {
            Ok(Some(row)) => row,
            Ok(None) => {
                debug!("Appointment {} is no longer movable", moved.id);
                tx.rollback().await?;
                return Ok(CommitOutcome::Stale);
            }
            Err(err) if is_unique_violation(&err) => {
                tx.rollback().await?;
                return Ok(CommitOutcome::Conflict);
            }
            Err(err) => return Err(err),
        };

        tx.commit().await?;
        Ok(CommitOutcome::Committed(Appointment::try_from(row)?))
    }

    async fn update_status(&self, change: &StatusChange) -> Result<Option<Appointment>> {
        appointment::update_appointment_status(&self.pool, change)
            .await?
            .map(Appointment::try_from)
            .transpose()
    }

    async fn remove_appointment(
        &self,
        id: Uuid,
        removed_by: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Appointment>> {
        appointment::soft_delete_appointment(&self.pool, id, removed_by, at)
            .await?
            .map(Appointment::try_from)
            .transpose()
    }
}
