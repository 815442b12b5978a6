//! Telemetry for the chat gateway: structured logging, a health registry
//! for the keyed store, and in-process counters exposed through `/health`.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
