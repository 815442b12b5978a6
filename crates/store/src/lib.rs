//! Keyed store client for the chat gateway.
//!
//! The gateway only needs single-key get/set/delete/expire and FIFO
//! push/pop on named lists. Every operation is atomic on its own; nothing
//! here spans two keys.

pub mod config;
pub mod health;
pub mod maintenance;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use config::*;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::*;
