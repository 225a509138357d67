pub mod appointment;
pub mod availability;
pub mod force_override;
pub mod resource;
pub mod shift;
