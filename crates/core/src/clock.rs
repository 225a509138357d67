use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Source of "now". Schedules are expressed in the clinic's local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a given local time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.0.and_utc()
    }
}
