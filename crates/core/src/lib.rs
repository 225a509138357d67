//! # modsched core
//!
//! Domain model and booking engine for imaging and diagnostic modalities.
//!
//! - **Models**: modalities, shifts, appointments and force overrides
//! - **Scheduling**: pure functions that turn shifts into slots and search
//!   for openings
//! - **Store**: the persistence trait, with an in-memory implementation
//! - **Scheduler**: the booking operations built on top of a store

pub mod clock;
pub mod config;
pub mod errors;
pub mod filters;
pub mod models;
pub mod scheduler;
pub mod scheduling;
pub mod store;

#[cfg(test)]
mod test_support;

pub use errors::{ScheduleError, ScheduleResult};
pub use scheduler::Scheduler;
