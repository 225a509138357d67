use chrono::NaiveTime;

/// Tunables for the scheduling pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingConfig {
    /// Treat Saturday and Sunday as closed in days mode.
    pub exclude_weekends: bool,
    /// Same-day slots must start later than now plus this many minutes.
    pub booking_lead_minutes: i64,
    /// Upper bound, in days, on a next-available search.
    pub search_horizon_days: u32,
    /// Slot length when neither the modality nor patient counts define one.
    pub default_slot_minutes: u32,
    /// Window used by force bookings when neither a shift nor the user's
    /// override defines one.
    pub force_window_start: NaiveTime,
    pub force_window_end: NaiveTime,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            exclude_weekends: false,
            booking_lead_minutes: 5,
            search_horizon_days: 365,
            default_slot_minutes: 30,
            force_window_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            force_window_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}
