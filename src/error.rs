//! Error types for the studio.

use crate::i18n::Translator;

/// Maximum length of a service error message kept for display.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while preparing or running an edit.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// No API key has been stored yet.
    #[error("API key is not configured")]
    MissingApiKey,

    /// Submission attempted without a selected image.
    #[error("no image selected")]
    MissingImage,

    /// Submission attempted without an instruction.
    #[error("instruction is empty")]
    EmptyInstruction,

    /// A dropped file did not pass the accept filter.
    #[error("unsupported file: {0}")]
    UnsupportedFile(String),

    /// The service rejected the API key.
    #[error("API key not valid")]
    InvalidApiKey,

    /// Any other generation failure, with the underlying detail.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error detail from the response.
        message: String,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading an upload or the storage file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StudioError {
    /// Returns true if the service rejected the credential.
    pub fn is_invalid_api_key(&self) -> bool {
        matches!(self, Self::InvalidApiKey)
    }

    /// Returns the localized message shown to the user for this error.
    pub fn user_message(&self, t: &Translator) -> String {
        let key = match self {
            Self::MissingApiKey => "api_key_missing",
            Self::MissingImage => "select_image_error",
            Self::EmptyInstruction => "empty_prompt_error",
            Self::UnsupportedFile(_) => "unsupported_file_error",
            Self::InvalidApiKey => "invalid_api_key",
            Self::GenerationFailed(_)
            | Self::Api { .. }
            | Self::Network(_)
            | Self::Decode(_)
            | Self::Json(_) => "generation_failed",
            Self::Io(_) => "unknown_error",
        };
        t.lookup(key).to_string()
    }
}

/// Trims an error body from the service down to something displayable.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return collapsed;
    }
    let truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    format!("{truncated}…")
}

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;
