//! # parley-entity
//!
//! Domain entity models for Parley. Every struct in this crate represents
//! a stored record or a domain value object. All entities derive `Debug`,
//! `Clone`, `Serialize` and `Deserialize`; wire names are camelCase.

pub mod conversation;
pub mod message;
pub mod user;

pub use conversation::{Conversation, ParticipantPair};
pub use message::{Message, MessageContent, NewMessage};
pub use user::UserProfile;
