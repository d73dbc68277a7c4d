//! Inbound frame and message content validation.

use parley_core::config::RealtimeConfig;
use parley_core::error::AppError;
use parley_entity::message::MessageContent;

/// Validates the raw size and shape of an inbound frame.
pub fn validate_frame(raw: &str, max_bytes: usize) -> Result<(), AppError> {
    if raw.len() > max_bytes {
        return Err(AppError::validation(format!(
            "Frame exceeds maximum size of {max_bytes} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty frame"));
    }

    Ok(())
}

/// Validates a message before it is stored.
///
/// At least one part must be non-blank, and each part must fit its limit.
pub fn validate_content(content: &MessageContent, config: &RealtimeConfig) -> Result<(), AppError> {
    if content.is_empty() {
        return Err(AppError::validation(
            "Message must contain text, an image or a video",
        ));
    }

    if let Some(text) = &content.text {
        if text.chars().count() > config.max_text_length {
            return Err(AppError::validation(format!(
                "Message text exceeds {} characters",
                config.max_text_length
            )));
        }
    }

    for (label, url) in [("Image", &content.image_url), ("Video", &content.video_url)] {
        if let Some(url) = url {
            validate_media_url(label, url, config.max_media_url_length)?;
        }
    }

    Ok(())
}

fn validate_media_url(label: &str, url: &str, max_length: usize) -> Result<(), AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(());
    }

    if url.len() > max_length {
        return Err(AppError::validation(format!(
            "{label} URL exceeds {max_length} characters"
        )));
    }

    if url.chars().any(char::is_whitespace) {
        return Err(AppError::validation(format!(
            "{label} URL must not contain whitespace"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::error::ErrorKind;

    #[test]
    fn test_oversized_and_blank_frames_are_rejected() {
        assert!(validate_frame(r#"{"event":"sidebar"}"#, 64).is_ok());
        assert_eq!(
            validate_frame(&"x".repeat(65), 64).unwrap_err().kind,
            ErrorKind::Validation
        );
        assert!(validate_frame("   ", 64).is_err());
    }

    #[test]
    fn test_empty_content_is_rejected() {
        let config = RealtimeConfig::default();
        let content = MessageContent {
            text: Some("  ".to_string()),
            ..MessageContent::default()
        };
        let err = validate_content(&content, &config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_media_only_content_is_accepted() {
        let config = RealtimeConfig::default();
        let content = MessageContent {
            video_url: Some("https://cdn.example/clip.mp4".to_string()),
            ..MessageContent::default()
        };
        assert!(validate_content(&content, &config).is_ok());
    }

    #[test]
    fn test_limits_come_from_config() {
        let config = RealtimeConfig {
            max_text_length: 5,
            max_media_url_length: 10,
            ..RealtimeConfig::default()
        };

        assert!(validate_content(&MessageContent::text("hello"), &config).is_ok());
        assert!(validate_content(&MessageContent::text("hello!"), &config).is_err());

        let content = MessageContent {
            image_url: Some("https://cdn.example/long.png".to_string()),
            ..MessageContent::default()
        };
        assert!(validate_content(&content, &config).is_err());
    }
}
