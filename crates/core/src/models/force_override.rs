use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user grant to book a modality outside its shift-derived slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForceOverride {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub is_able_to_force: bool,
    /// Default window used when no shift definition applies on a date.
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub number_of_patients: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceAbilityResponse {
    pub modality_id: Uuid,
    pub user_id: Uuid,
    pub is_able_to_force: bool,
}
