pub mod registration;

pub use registration::{RegistrationConfig, RegistrationMode, ScanEntry, DEFAULT_LIFETIME_ENV};
