//! Per-connection event state machine.

pub mod message_router;
pub mod session;

pub use message_router::MessageRouter;
pub use session::{Session, SessionState};
