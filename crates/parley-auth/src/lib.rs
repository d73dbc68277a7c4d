//! # parley-auth
//!
//! Credential verification for Parley. Token issuance belongs to the account
//! service; this crate only checks HS256 bearer tokens presented on connect
//! and maps them to a [`UserId`](parley_core::types::id::UserId).

pub mod jwt;

pub use jwt::{Claims, JwtIdentityResolver};
