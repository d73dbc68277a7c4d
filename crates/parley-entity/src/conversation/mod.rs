//! Two-party conversation entities.

pub mod model;
pub mod pair;

pub use model::Conversation;
pub use pair::ParticipantPair;
