//! Response bodies.

pub mod response;

pub use response::{ApiErrorResponse, HealthResponse};
