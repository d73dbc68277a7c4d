//! Per-connection handle and keepalive.

pub mod handle;
pub mod heartbeat;

pub use handle::ConnectionHandle;
pub use heartbeat::{HeartbeatConfig, run_heartbeat};
