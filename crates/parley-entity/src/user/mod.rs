//! User profile entities.

pub mod profile;

pub use profile::UserProfile;
