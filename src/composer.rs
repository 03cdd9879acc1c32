//! Edit request composition: image, style preset and instruction.

use crate::error::{Result, StudioError};
use crate::gallery::ImageSource;
use crate::i18n::Translator;
use crate::image::ImagePayload;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Style presets offered next to the instruction box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    /// Modern.
    Modern,
    /// Minimalist.
    Minimalist,
    /// Bohemian.
    Bohemian,
    /// Industrial.
    Industrial,
    /// Coastal.
    Coastal,
    /// Farmhouse.
    Farmhouse,
}

impl StylePreset {
    /// All presets in display order.
    pub const ALL: [StylePreset; 6] = [
        Self::Modern,
        Self::Minimalist,
        Self::Bohemian,
        Self::Industrial,
        Self::Coastal,
        Self::Farmhouse,
    ];

    /// English name, used in the instruction sent to the model.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Modern => "Modern",
            Self::Minimalist => "Minimalist",
            Self::Bohemian => "Bohemian",
            Self::Industrial => "Industrial",
            Self::Coastal => "Coastal",
            Self::Farmhouse => "Farmhouse",
        }
    }

    /// Message key of the localized button label.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Modern => "style_modern",
            Self::Minimalist => "style_minimalist",
            Self::Bohemian => "style_bohemian",
            Self::Industrial => "style_industrial",
            Self::Coastal => "style_coastal",
            Self::Farmhouse => "style_farmhouse",
        }
    }

    /// Localized button label.
    pub fn localized(&self, t: &Translator) -> &'static str {
        t.lookup(self.message_key())
    }
}

impl std::fmt::Display for StylePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StylePreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown style '{s}'"))
    }
}

/// A fully prepared request, built fresh for each submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    /// Instruction with the style prefix applied.
    pub instruction: String,
    /// Style that was selected, if any.
    pub style: Option<StylePreset>,
    /// Encoded source image.
    pub image: ImagePayload,
}

/// Joins the optional style and the free text into the instruction.
pub fn compose_instruction(style: Option<StylePreset>, text: &str) -> String {
    match style {
        Some(style) => format!("{} style: {}", style.label(), text),
        None => text.to_string(),
    }
}

/// Collects the candidate image, style and instruction before submission.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    candidate: Option<ImageSource>,
    style: Option<StylePreset>,
    text: String,
    error: Option<String>,
}

impl Composer {
    /// Creates an empty composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the candidate image and clears any validation message.
    pub fn set_image(&mut self, image: ImageSource) {
        self.candidate = Some(image);
        self.error = None;
    }

    /// Returns the candidate image.
    pub fn image(&self) -> Option<&ImageSource> {
        self.candidate.as_ref()
    }

    /// Sets the free-text instruction.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Returns the free-text instruction.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Toggles `style`: the active style is deselected, any other replaces it.
    pub fn toggle_style(&mut self, style: StylePreset) {
        self.style = if self.style == Some(style) {
            None
        } else {
            Some(style)
        };
    }

    /// Returns the selected style.
    pub fn style(&self) -> Option<StylePreset> {
        self.style
    }

    /// Returns the inline validation message from the last submit, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the generate action is enabled.
    pub fn can_submit(&self, pending: bool) -> bool {
        !pending && self.candidate.is_some() && !self.text.trim().is_empty()
    }

    /// Returns the instruction as it would be sent now.
    pub fn instruction(&self) -> String {
        compose_instruction(self.style, &self.text)
    }

    /// Validates the current inputs and captures them for submission.
    ///
    /// Without a candidate image this records the localized
    /// "select an image first" message and fails before any network use.
    pub fn begin(&mut self, t: &Translator) -> Result<PendingEdit> {
        let Some(candidate) = self.candidate.clone() else {
            self.error = Some(t.lookup("select_image_error").to_string());
            return Err(StudioError::MissingImage);
        };
        if self.text.trim().is_empty() {
            self.error = Some(t.lookup("empty_prompt_error").to_string());
            return Err(StudioError::EmptyInstruction);
        }
        self.error = None;

        Ok(PendingEdit {
            source: candidate,
            instruction: self.instruction(),
            style: self.style,
        })
    }

    /// Validates and encodes the current inputs.
    pub async fn prepare(&mut self, http: &reqwest::Client, t: &Translator) -> Result<EditRequest> {
        self.begin(t)?.encode(http).await
    }
}

/// Validated inputs whose image has not been encoded yet.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    source: ImageSource,
    instruction: String,
    style: Option<StylePreset>,
}

impl PendingEdit {
    /// Returns the composed instruction.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Returns the source image.
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Encodes the image, fetching it if remote.
    pub async fn encode(self, http: &reqwest::Client) -> Result<EditRequest> {
        let image = self.source.to_payload(http).await?;
        Ok(EditRequest {
            instruction: self.instruction,
            style: self.style,
            image,
        })
    }
}
