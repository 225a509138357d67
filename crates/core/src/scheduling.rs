//! The read-side pipeline: resolve shifts, generate candidates, subtract
//! bookings, apply rules, search forward. No I/O happens in here.

pub mod availability;
pub mod finder;
pub mod rules;
pub mod shifts;
pub mod slots;
