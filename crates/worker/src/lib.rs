//! Background workers for the chat gateway.

pub mod health_probe;
pub mod scheduler;

pub use health_probe::StoreHealthProbe;
pub use scheduler::{WorkerConfig, WorkerScheduler};
