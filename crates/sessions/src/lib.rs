//! Session token lifecycle for the chat gateway.

pub mod config;
pub mod manager;

pub use config::SessionConfig;
pub use manager::SessionManager;
