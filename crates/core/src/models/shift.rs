use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftPeriod {
    Morning,
    Afternoon,
}

impl ShiftPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftPeriod::Morning => "morning",
            ShiftPeriod::Afternoon => "afternoon",
        }
    }

    /// Period a bare time of day falls into, used for slots that do not come
    /// from a shift definition.
    pub fn of_time(time: NaiveTime) -> Self {
        if time < NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN) {
            ShiftPeriod::Morning
        } else {
            ShiftPeriod::Afternoon
        }
    }
}

impl std::str::FromStr for ShiftPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(ShiftPeriod::Morning),
            "afternoon" => Ok(ShiftPeriod::Afternoon),
            other => Err(format!("unknown shift period: {other}")),
        }
    }
}

/// A staffed window on a modality.
///
/// Recurring definitions carry `day_of_week` and no `date`; date-specific
/// definitions carry `date` and win over the recurring one for the same
/// period on that day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShiftDefinition {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub day_of_week: Option<Weekday>,
    pub date: Option<NaiveDate>,
    pub shift_period: ShiftPeriod,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub patients_per_shift: Option<u32>,
    pub is_active: bool,
}

impl ShiftDefinition {
    pub fn is_date_specific(&self) -> bool {
        self.date.is_some()
    }

    /// Length of the shift in whole minutes; zero for inverted windows.
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes().max(0)
    }
}
