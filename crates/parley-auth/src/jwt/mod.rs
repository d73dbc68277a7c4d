//! JWT claims and verification.

pub mod claims;
pub mod resolver;

pub use claims::Claims;
pub use resolver::JwtIdentityResolver;
