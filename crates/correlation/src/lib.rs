//! Request/reply correlation for the chat gateway.
//!
//! A caller's request is recorded and pushed onto the inbound queue; the
//! reply comes back either on the shared outbound queue or as a direct key.
//! One [`ReplyDispatcher`] per process owns the outbound queue and hands
//! replies to the waiting caller, so concurrent callers never pop each
//! other's replies.

pub mod config;
pub mod dispatcher;
pub mod gateway;

pub use config::CorrelationConfig;
pub use dispatcher::{PendingReply, ReplyDispatcher};
pub use gateway::CorrelationGateway;
