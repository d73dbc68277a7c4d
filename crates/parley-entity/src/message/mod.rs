//! Chat message entities.

pub mod content;
pub mod model;

pub use content::MessageContent;
pub use model::{Message, NewMessage};
