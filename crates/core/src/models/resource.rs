use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking granularity of a modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    /// Fixed-duration slots inside staffed shifts.
    Minutes,
    /// Whole days, or a contiguous run of days.
    Days,
}

impl SlotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotType::Minutes => "minutes",
            SlotType::Days => "days",
        }
    }
}

impl std::str::FromStr for SlotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minutes" => Ok(SlotType::Minutes),
            "days" => Ok(SlotType::Days),
            other => Err(format!("unknown slot type: {other}")),
        }
    }
}

/// A schedulable piece of equipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub slot_type: SlotType,
    /// Fixed slot length in minutes mode. `None` derives it from patient counts.
    pub slot_duration_minutes: Option<u32>,
    /// Upper bound on `duration_days` in days mode.
    pub max_bookable_days: Option<u32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    /// Days mode without an explicit cap allows single-day bookings only.
    pub fn max_days(&self) -> u32 {
        self.max_bookable_days.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSlotTypeRequest {
    pub slot_type: SlotType,
}
