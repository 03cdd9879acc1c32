//! Side-by-side view of the original and generated images.

use crate::gallery::ImageSource;
use crate::i18n::Translator;
use crate::image::GeneratedImage;

/// What a pane shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneContent {
    /// An image, described by a displayable reference.
    Image(String),
    /// A localized placeholder message.
    Placeholder(String),
}

/// One labelled side of the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pane {
    /// Localized pane title.
    pub label: String,
    /// Image or placeholder.
    pub content: PaneContent,
}

/// The rendered comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Left side: the selected image.
    pub original: Pane,
    /// Right side: the edited image.
    pub generated: Pane,
}

impl Comparison {
    /// Builds the comparison for the given images.
    pub fn new(
        original: Option<&ImageSource>,
        generated: Option<&GeneratedImage>,
        t: &Translator,
    ) -> Self {
        let original = Pane {
            label: t.lookup("original_image_label").to_string(),
            content: match original {
                Some(source) => PaneContent::Image(source.display_ref().to_string()),
                None => PaneContent::Placeholder(t.lookup("no_original_image").to_string()),
            },
        };
        let generated = Pane {
            label: t.lookup("generated_image_label").to_string(),
            content: match generated {
                Some(image) => PaneContent::Image(describe(image)),
                None => PaneContent::Placeholder(t.lookup("generated_image_placeholder").to_string()),
            },
        };
        Self { original, generated }
    }
}

fn describe(image: &GeneratedImage) -> String {
    match image.decode() {
        Ok(bytes) => format!("{} ({} bytes)", image.mime_type, bytes.len()),
        Err(_) => image.mime_type.clone(),
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for pane in [&self.original, &self.generated] {
            match &pane.content {
                PaneContent::Image(reference) => writeln!(f, "{}: {}", pane.label, reference)?,
                PaneContent::Placeholder(message) => writeln!(f, "{}: [{}]", pane.label, message)?,
            }
        }
        Ok(())
    }
}
