//! Traits for external collaborators, defined in `parley-core` and
//! implemented by other crates.

pub mod identity;

pub use identity::IdentityResolver;
