//! Chat completion client: payload assembly and the resilient HTTP caller.

pub mod caller;
pub mod payload;

use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("JSON error: {0}")]
    JsonError(String),
    #[error("Missing client/API key: {0}")]
    MissingConfig(String),
    #[error("Image error: {0}")]
    ImageError(String),
}

/// One inbound request to relay to the model. Built per message, dropped
/// after the call.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// User text; the payload builder substitutes a placeholder when empty
    pub user_text: String,
    /// Decoded picture, re-encoded to PNG at payload build time
    pub image: Option<DynamicImage>,
}

impl ChatRequest {
    /// Text-only request
    #[must_use]
    pub fn text(user_text: impl Into<String>) -> Self {
        Self {
            user_text: user_text.into(),
            image: None,
        }
    }

    /// Request with an attached picture
    #[must_use]
    pub fn with_image(user_text: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            user_text: user_text.into(),
            image: Some(image),
        }
    }

    /// Whether an image is attached (drives the persona override)
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Fixed sampling parameters attached to every payload
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f32,
    /// Omitted from the payload when `None`
    pub max_tokens: Option<u32>,
}

impl From<&crate::config::Settings> for SamplingParams {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}
