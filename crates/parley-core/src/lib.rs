//! # parley-core
//!
//! Core crate for Parley. Contains the unified error system, configuration
//! schemas, typed identifiers and the traits for external collaborators
//! (identity resolution).
//!
//! This crate has **no** internal dependencies on other Parley crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
