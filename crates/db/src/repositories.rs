pub mod appointment;
pub mod force_override;
pub mod modality;
pub mod shift;
