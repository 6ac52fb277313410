//! Chat completion payload assembly.
//!
//! Builds the provider JSON body from a persona, the user text and an
//! optional picture. The picture is re-encoded to PNG and embedded as a
//! base64 data URI in an `image_url` content block, matching the
//! OpenAI-compatible multimodal message shape.

use crate::llm::{ChatRequest, LlmError, SamplingParams};
use crate::personas::Persona;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat};
use serde_json::{json, Value};
use std::io::Cursor;

/// User text substituted when the message carries no usable text
pub const DEFAULT_USER_TEXT: &str = "Analiza esto, patrón.";

/// Stylistic suffix appended to every persona system prompt
pub const SYSTEM_SUFFIX: &str = " Responde siempre con flow chilango de barrio bravo.";

/// Build the `chat/completions` request body.
///
/// The user message is a single message with ordered content blocks: the
/// text block first, then the image block when a picture is attached.
///
/// # Errors
///
/// Returns [`LlmError::ImageError`] if PNG encoding fails.
pub fn build_payload(
    persona: &Persona,
    request: &ChatRequest,
    params: SamplingParams,
) -> Result<Value, LlmError> {
    let text = if request.user_text.trim().is_empty() {
        DEFAULT_USER_TEXT
    } else {
        request.user_text.as_str()
    };

    let mut user_content = vec![json!({"type": "text", "text": text})];

    if let Some(image) = &request.image {
        let data_url = encode_png_data_url(image)?;
        user_content.push(json!({
            "type": "image_url",
            "image_url": {"url": data_url}
        }));
    }

    let system_prompt = format!("{}{SYSTEM_SUFFIX}", persona.system_prompt);

    let mut body = json!({
        "model": persona.model_id,
        "messages": [
            {"role": "system", "content": system_prompt},
            {"role": "user", "content": user_content}
        ],
        "temperature": params.temperature,
    });

    if let Some(max_tokens) = params.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }

    Ok(body)
}

/// PNG-encode a picture and wrap it as a base64 data URI.
///
/// No size limit is enforced; arbitrarily large pictures are encoded as-is
/// (known limitation).
fn encode_png_data_url(image: &DynamicImage) -> Result<String, LlmError> {
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| LlmError::ImageError(e.to_string()))?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
}
