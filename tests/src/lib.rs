//! Shared harness for the gateway integration tests.

pub mod containers;
pub mod mocks;
pub mod setup;
