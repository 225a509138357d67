pub mod appointments;
pub mod modalities;
