//! Core types, key naming, and validation for the Emotika chat gateway.

pub mod chat;
pub mod error;
pub mod keys;
pub mod session;

pub use chat::*;
pub use error::{Error, Result};
pub use session::*;
