//! Image editor trait.

use crate::error::Result;
use crate::image::types::{GeneratedImage, ImagePayload};
use async_trait::async_trait;

/// A service that edits an image according to a text instruction.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Sends one edit request.
    ///
    /// `Ok(None)` means the service answered but produced no image. Failures
    /// are classified as [`StudioError::InvalidApiKey`] or
    /// [`StudioError::GenerationFailed`]; nothing is retried.
    ///
    /// [`StudioError::InvalidApiKey`]: crate::StudioError::InvalidApiKey
    /// [`StudioError::GenerationFailed`]: crate::StudioError::GenerationFailed
    async fn edit(
        &self,
        api_key: &str,
        instruction: &str,
        image: &ImagePayload,
    ) -> Result<Option<GeneratedImage>>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;
}
