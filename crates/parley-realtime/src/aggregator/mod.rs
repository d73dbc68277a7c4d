//! Per-user conversation summaries.

pub mod sidebar;
pub mod summary;

pub use sidebar::ConversationAggregator;
pub use summary::{ConversationSummary, MessagePreview, PeerSummary};
