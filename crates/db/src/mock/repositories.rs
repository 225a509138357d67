use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use uuid::Uuid;

use modsched_core::filters::{AppointmentFilter, ShiftFilter};
use modsched_core::models::appointment::Appointment;
use modsched_core::models::force_override::ForceOverride;
use modsched_core::models::resource::{Resource, SlotType};
use modsched_core::models::shift::ShiftDefinition;
use modsched_core::store::{CommitOutcome, SchedulingStore, SlotTypeChange, StatusChange};

// Mock store for handler tests that need to script storage failures
mock! {
    pub Store {}

    #[async_trait]
    impl SchedulingStore for Store {
        async fn get_resource(&self, id: Uuid) -> eyre::Result<Option<Resource>>;

        async fn change_slot_type(
            &self,
            id: Uuid,
            slot_type: SlotType,
        ) -> eyre::Result<SlotTypeChange>;

        async fn list_shift_definitions(
            &self,
            filter: &ShiftFilter,
        ) -> eyre::Result<Vec<ShiftDefinition>>;

        async fn get_force_override(
            &self,
            resource_id: Uuid,
            user_id: Uuid,
        ) -> eyre::Result<Option<ForceOverride>>;

        async fn find_appointments(
            &self,
            filter: &AppointmentFilter,
        ) -> eyre::Result<Vec<Appointment>>;

        async fn get_appointment(&self, id: Uuid) -> eyre::Result<Option<Appointment>>;

        async fn insert_appointment(
            &self,
            appointment: Appointment,
            retire: Option<Uuid>,
        ) -> eyre::Result<CommitOutcome>;

        async fn reschedule_appointment(
            &self,
            appointment: Appointment,
        ) -> eyre::Result<CommitOutcome>;

        async fn update_status(&self, change: &StatusChange) -> eyre::Result<Option<Appointment>>;

        async fn remove_appointment(
            &self,
            id: Uuid,
            removed_by: Uuid,
            at: DateTime<Utc>,
        ) -> eyre::Result<Option<Appointment>>;
    }
}
