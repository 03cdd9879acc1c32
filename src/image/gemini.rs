//! Gemini (Google) image editing client.

use crate::error::{sanitize_error_message, Result, StudioError};
use crate::image::editor::ImageEditor;
use crate::image::types::{GeneratedImage, ImagePayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Public Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Substring the service puts in its message when the key is rejected.
const INVALID_KEY_MARKER: &str = "API key not valid";

/// Structured reason the service attaches to a rejected key.
const INVALID_KEY_REASON: &str = "API_KEY_INVALID";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image preview.
    #[default]
    FlashImagePreview,
    /// Gemini 2.5 Flash Image (generally available).
    FlashImage,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImagePreview => "gemini-2.5-flash-image-preview",
            Self::FlashImage => "gemini-2.5-flash-image",
        }
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeminiModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "gemini-2.5-flash-image-preview" | "preview" => Ok(Self::FlashImagePreview),
            "gemini-2.5-flash-image" | "flash" => Ok(Self::FlashImage),
            other => Err(format!("unknown Gemini image model '{other}'")),
        }
    }
}

/// Wraps the user's instruction in the room-preserving edit prompt.
pub fn build_prompt(instruction: &str) -> String {
    format!(
        "Given the user's image, apply the following changes while preserving the original \
         perspective and overall structure of the room. Changes: \"{instruction}\""
    )
}

/// Builder for GeminiClient.
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    model: GeminiModel,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL (defaults to [`DEFAULT_BASE_URL`]).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout (defaults to two minutes).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<GeminiClient> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiClient {
            client,
            base_url,
            model: self.model,
        })
    }
}

/// Gemini image editing client.
///
/// The API key is supplied per call, so one client serves key changes.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: GeminiModel,
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    /// Returns the shared HTTP client (also used to fetch gallery images).
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model.as_str())
    }

    /// Asks the model to apply `instruction` to `image`.
    ///
    /// Returns the first inline image of the response, or `None` when the
    /// model answered without one.
    pub async fn generate(
        &self,
        api_key: &str,
        instruction: &str,
        image: &ImagePayload,
    ) -> Result<Option<GeneratedImage>> {
        self.generate_impl(api_key, instruction, image)
            .await
            .map_err(classify)
    }

    async fn generate_impl(
        &self,
        api_key: &str,
        instruction: &str,
        image: &ImagePayload,
    ) -> Result<Option<GeneratedImage>> {
        let start = Instant::now();
        let url = format!("{}:generateContent", self.model_url());
        let body = GeminiRequest::new(instruction, image);

        tracing::debug!(
            model = self.model.as_str(),
            mime_type = %image.mime_type,
            payload_len = image.data.len(),
            "sending Gemini edit request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let image = first_inline_image(gemini_response)?;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            has_image = image.is_some(),
            "Gemini edit request complete"
        );
        Ok(image)
    }

    /// Checks that the service accepts `api_key`.
    pub async fn verify_key(&self, api_key: &str) -> Result<()> {
        let response = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", api_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        match parse_error(status.as_u16(), &text) {
            StudioError::Api { status: 401 | 403, .. } => Err(StudioError::InvalidApiKey),
            err => Err(err),
        }
    }
}

#[async_trait]
impl ImageEditor for GeminiClient {
    async fn edit(
        &self,
        api_key: &str,
        instruction: &str,
        image: &ImagePayload,
    ) -> Result<Option<GeneratedImage>> {
        self.generate(api_key, instruction, image).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

/// Collapses every failure into the two kinds callers distinguish.
fn classify(err: StudioError) -> StudioError {
    match err {
        StudioError::InvalidApiKey => {
            tracing::warn!("Gemini rejected the API key");
            StudioError::InvalidApiKey
        }
        StudioError::GenerationFailed(detail) => StudioError::GenerationFailed(detail),
        other => {
            tracing::warn!(error = %other, "Gemini edit request failed");
            StudioError::GenerationFailed(other.to_string())
        }
    }
}

/// Maps an error response to a `StudioError`.
///
/// The structured reason is checked first; the message substring is a
/// fallback for bodies that carry no details.
fn parse_error(status: u16, text: &str) -> StudioError {
    let parsed = serde_json::from_str::<GeminiErrorResponse>(text)
        .ok()
        .map(|r| r.error);

    if let Some(ref body) = parsed {
        let structured = body
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some(INVALID_KEY_REASON))
            || body.status.as_deref() == Some("UNAUTHENTICATED");
        if structured || body.message.contains(INVALID_KEY_MARKER) {
            return StudioError::InvalidApiKey;
        }
    } else if text.contains(INVALID_KEY_MARKER) {
        return StudioError::InvalidApiKey;
    }

    let message = match parsed {
        Some(body) if !body.message.is_empty() => sanitize_error_message(&body.message),
        _ => sanitize_error_message(text),
    };
    StudioError::Api { status, message }
}

/// Returns the first non-empty inline image among the first candidate's parts.
fn first_inline_image(response: GeminiResponse) -> Result<Option<GeneratedImage>> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(StudioError::GenerationFailed(format!("prompt blocked: {reason}")));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(None);
    };
    if let Some(ref reason) = candidate.finish_reason {
        tracing::debug!(finish_reason = %reason, "Gemini candidate finished");
    }

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    for part in parts {
        if let Some(text) = part.text.as_deref() {
            tracing::debug!(text, "Gemini returned text part");
        }
        if let Some(inline) = part.inline_data.filter(|d| !d.data.is_empty()) {
            return Ok(Some(GeneratedImage::new(inline.mime_type, inline.data)));
        }
    }
    Ok(None)
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiRequestPart<'a>>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: &'a ImagePayload,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<&'static str>,
}

impl<'a> GeminiRequest<'a> {
    fn new(instruction: &str, image: &'a ImagePayload) -> Self {
        let parts = vec![
            GeminiRequestPart::InlineData { inline_data: image },
            GeminiRequestPart::Text {
                text: build_prompt(instruction),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ImagePayload {
        ImagePayload {
            mime_type: "image/jpeg".into(),
            data: "/9j/4AAQ".into(),
        }
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(
            GeminiModel::FlashImagePreview.as_str(),
            "gemini-2.5-flash-image-preview"
        );
        assert_eq!(GeminiModel::FlashImage.as_str(), "gemini-2.5-flash-image");
        assert_eq!(GeminiModel::default(), GeminiModel::FlashImagePreview);
    }

    #[test]
    fn test_gemini_model_from_str() {
        assert_eq!(
            "gemini-2.5-flash-image".parse::<GeminiModel>(),
            Ok(GeminiModel::FlashImage)
        );
        assert_eq!("preview".parse::<GeminiModel>(), Ok(GeminiModel::FlashImagePreview));
        assert!("imagen".parse::<GeminiModel>().is_err());
    }

    #[test]
    fn test_builder_trims_base_url() {
        let client = GeminiClient::builder()
            .base_url("http://localhost:8080/")
            .model(GeminiModel::FlashImage)
            .build()
            .unwrap();
        assert_eq!(
            client.model_url(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash-image"
        );
    }

    #[test]
    fn test_build_prompt() {
        assert_eq!(
            build_prompt("Coastal style: add large windows"),
            "Given the user's image, apply the following changes while preserving the original \
             perspective and overall structure of the room. Changes: \"Coastal style: add large windows\""
        );
    }

    #[test]
    fn test_request_has_image_then_text() {
        let image = payload();
        let json = serde_json::to_value(GeminiRequest::new("add plants", &image)).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "/9j/4AAQ");
        assert_eq!(parts[1]["text"], build_prompt("add plants"));
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE", "TEXT"])
        );
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_first_inline_image_skips_text_parts() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your room"},
                        {"inlineData": {"mimeType": "image/png", "data": ""}},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}},
                        {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/"}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let image = first_inline_image(resp).unwrap().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_text_only_response_is_soft_failure() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "I cannot edit this image."}]}
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(first_inline_image(resp).unwrap().is_none());
    }

    #[test]
    fn test_empty_candidates_is_soft_failure() {
        let resp: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(first_inline_image(resp).unwrap().is_none());

        let resp: GeminiResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#).unwrap();
        assert!(first_inline_image(resp).unwrap().is_none());
    }

    #[test]
    fn test_blocked_prompt_is_generation_failure() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = first_inline_image(resp).unwrap_err();
        assert!(matches!(err, StudioError::GenerationFailed(ref m) if m.contains("SAFETY")));
    }

    #[test]
    fn test_parse_error_structured_invalid_key() {
        let body = r#"{
            "error": {
                "code": 400,
                "message": "Request rejected.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason": "API_KEY_INVALID",
                    "domain": "googleapis.com"
                }]
            }
        }"#;
        assert!(parse_error(400, body).is_invalid_api_key());
    }

    #[test]
    fn test_parse_error_message_substring_fallback() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}}"#;
        assert!(parse_error(400, body).is_invalid_api_key());
        assert!(parse_error(400, "API key not valid").is_invalid_api_key());
    }

    #[test]
    fn test_parse_error_generic() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        match parse_error(429, body) {
            StudioError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match parse_error(502, "<html>Bad Gateway</html>") {
            StudioError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "<html>Bad Gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_keeps_only_two_kinds() {
        assert!(classify(StudioError::InvalidApiKey).is_invalid_api_key());

        let err = classify(StudioError::Api {
            status: 500,
            message: "internal".into(),
        });
        assert!(matches!(err, StudioError::GenerationFailed(ref m) if m.contains("internal")));

        let err = classify(StudioError::Decode("bad".into()));
        assert!(matches!(err, StudioError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn test_transport_error_is_generic_failure() {
        let client = GeminiClient::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let image = payload();

        let err = client.generate("key", "add plants", &image).await.unwrap_err();
        assert!(matches!(err, StudioError::GenerationFailed(ref m) if m.contains("network error")));
        assert!(!err.is_invalid_api_key());
    }
}
