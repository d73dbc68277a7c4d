//! Message payload: text and/or media references.

use serde::{Deserialize, Serialize};

/// What a message carries. At least one part must be present for the
/// message to be accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    /// Plain text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// URL of an attached image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// URL of an attached video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl MessageContent {
    /// Text-only content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Drop parts that are blank so they are stored as absent.
    pub fn normalized(self) -> Self {
        fn keep(part: Option<String>) -> Option<String> {
            part.filter(|s| !s.trim().is_empty())
        }

        Self {
            text: keep(self.text),
            image_url: keep(self.image_url),
            video_url: keep(self.video_url),
        }
    }

    /// Whether no part carries anything.
    pub fn is_empty(&self) -> bool {
        let blank = |part: &Option<String>| part.as_deref().is_none_or(|s| s.trim().is_empty());
        blank(&self.text) && blank(&self.image_url) && blank(&self.video_url)
    }

    /// Whether an image is attached.
    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }

    /// Whether a video is attached.
    pub fn has_video(&self) -> bool {
        self.video_url.is_some()
    }
}
