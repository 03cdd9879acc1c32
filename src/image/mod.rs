//! Image editing module.

mod editor;
mod gemini;
mod types;

pub use editor::ImageEditor;
pub use gemini::{build_prompt, GeminiClient, GeminiClientBuilder, GeminiModel, DEFAULT_BASE_URL};
pub use types::{GeneratedImage, ImageFormat, ImagePayload};
