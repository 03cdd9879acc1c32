//! The edit workflow: selection, composition, generation, display.
//!
//! [`Studio`] is shared by reference. Its state sits behind a mutex that is
//! released before any await, and a `pending` flag keeps at most one edit in
//! flight: a submit while pending is ignored without touching the network.
//!
//! Each selection bumps an epoch. A request that completes after the user
//! picked another image only clears `pending`; its result is dropped.

use crate::composer::{Composer, StylePreset};
use crate::error::StudioError;
use crate::gallery::ImageSource;
use crate::i18n::Translator;
use crate::image::{GeneratedImage, ImageEditor};
use crate::viewer::Comparison;
use std::sync::{Mutex, MutexGuard};

/// Workflow state once an image has been chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The image being edited.
    pub original: ImageSource,
    /// True while an edit request is in flight.
    pub pending: bool,
    /// Latest generated image.
    pub result: Option<GeneratedImage>,
    /// Latest error notice, replaced by the next one.
    pub error: Option<String>,
}

/// Workflow state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StudioState {
    /// Nothing selected yet; the selector is shown.
    #[default]
    NoImage,
    /// An image is selected.
    ImageSelected(Selection),
}

impl StudioState {
    /// Returns the selection, if any.
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Self::NoImage => None,
            Self::ImageSelected(selection) => Some(selection),
        }
    }

    fn selection_mut(&mut self) -> Option<&mut Selection> {
        match self {
            Self::NoImage => None,
            Self::ImageSelected(selection) => Some(selection),
        }
    }

    fn is_pending(&self) -> bool {
        self.selection().is_some_and(|s| s.pending)
    }
}

/// What a call to [`Studio::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The request ran; the state holds a result or an error.
    Completed,
    /// The inputs failed validation; nothing was sent.
    Rejected,
    /// Another request was in flight; nothing happened.
    Ignored,
    /// The request ran but a newer selection made its outcome irrelevant.
    Discarded,
}

#[derive(Debug, Default)]
struct Inner {
    state: StudioState,
    composer: Composer,
    epoch: u64,
}

/// Orchestrates one editing session over an [`ImageEditor`].
pub struct Studio<E> {
    editor: E,
    http: reqwest::Client,
    inner: Mutex<Inner>,
}

impl<E: ImageEditor> Studio<E> {
    /// Creates a studio with nothing selected.
    ///
    /// `http` is used to fetch remote gallery images before encoding.
    pub fn new(editor: E, http: reqwest::Client) -> Self {
        Self {
            editor,
            http,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Returns the editor backing this studio.
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> StudioState {
        self.lock().state.clone()
    }

    /// Returns true while a request is in flight.
    pub fn is_pending(&self) -> bool {
        self.lock().state.is_pending()
    }

    /// Whether the generate action is currently enabled.
    pub fn can_submit(&self) -> bool {
        let inner = self.lock();
        inner.composer.can_submit(inner.state.is_pending())
    }

    /// Makes `image` the active image, clearing any result and error.
    pub fn select_image(&self, image: ImageSource) {
        let mut inner = self.lock();
        inner.epoch += 1;
        let pending = inner.state.is_pending();
        tracing::debug!(image = image.display_ref(), epoch = inner.epoch, "image selected");

        inner.composer.set_image(image.clone());
        inner.state = StudioState::ImageSelected(Selection {
            original: image,
            pending,
            result: None,
            error: None,
        });
    }

    /// Sets the free-text instruction.
    pub fn set_instruction(&self, text: impl Into<String>) {
        self.lock().composer.set_text(text);
    }

    /// Toggles a style preset.
    pub fn toggle_style(&self, style: StylePreset) {
        self.lock().composer.toggle_style(style);
    }

    /// Returns the selected style.
    pub fn style(&self) -> Option<StylePreset> {
        self.lock().composer.style()
    }

    /// Returns the instruction as it would be sent now.
    pub fn instruction(&self) -> String {
        self.lock().composer.instruction()
    }

    /// Returns the composer's inline validation message.
    pub fn validation_error(&self) -> Option<String> {
        self.lock().composer.error().map(str::to_string)
    }

    /// Returns the current comparison view.
    pub fn comparison(&self, t: &Translator) -> Comparison {
        let inner = self.lock();
        let selection = inner.state.selection();
        Comparison::new(
            selection.map(|s| &s.original),
            selection.and_then(|s| s.result.as_ref()),
            t,
        )
    }

    /// Submits the composed edit.
    ///
    /// Validation failures are reported inline by the composer (or as the
    /// error notice for a missing key) and never reach the editor.
    pub async fn submit(&self, api_key: Option<&str>, t: &Translator) -> SubmitOutcome {
        let (edit, api_key, epoch) = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            if inner.state.is_pending() {
                tracing::debug!("submit ignored, a request is already pending");
                return SubmitOutcome::Ignored;
            }

            let edit = match inner.composer.begin(t) {
                Ok(edit) => edit,
                Err(err) => {
                    tracing::debug!(error = %err, "submit rejected");
                    return SubmitOutcome::Rejected;
                }
            };

            let Some(api_key) = api_key.map(str::to_string) else {
                if let Some(selection) = inner.state.selection_mut() {
                    selection.error = Some(StudioError::MissingApiKey.user_message(t));
                }
                return SubmitOutcome::Rejected;
            };

            if let Some(current) = inner.state.selection_mut() {
                current.pending = true;
                current.result = None;
                current.error = None;
            }

            (edit, api_key, inner.epoch)
        };

        tracing::info!(instruction = edit.instruction(), editor = self.editor.name(), "generating design");
        let outcome = match edit.encode(&self.http).await {
            Ok(request) => {
                self.editor
                    .edit(&api_key, &request.instruction, &request.image)
                    .await
            }
            Err(err) => Err(StudioError::GenerationFailed(err.to_string())),
        };

        let mut inner = self.lock();
        let stale = inner.epoch != epoch;
        let Some(selection) = inner.state.selection_mut() else {
            return SubmitOutcome::Discarded;
        };
        selection.pending = false;
        if stale {
            tracing::debug!("discarding result for a previous selection");
            return SubmitOutcome::Discarded;
        }

        match outcome {
            Ok(Some(image)) => selection.result = Some(image),
            Ok(None) => {
                tracing::warn!("model returned no image");
                selection.error = Some(t.lookup("no_image_returned").to_string());
            }
            Err(err) => selection.error = Some(err.user_message(t)),
        }
        SubmitOutcome::Completed
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::gallery::{ImageSelector, UploadedImage};
    use crate::i18n::Language;
    use crate::image::ImagePayload;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    enum Reply {
        Image(&'static str),
        Nothing,
        InvalidKey,
        Failed,
    }

    struct FakeEditor {
        reply: Reply,
        calls: AtomicUsize,
        last_instruction: Mutex<Option<String>>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeEditor {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                last_instruction: Mutex::new(None),
                gate: None,
            }
        }

        fn gated(reply: Reply, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(reply)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageEditor for FakeEditor {
        async fn edit(
            &self,
            _api_key: &str,
            instruction: &str,
            _image: &ImagePayload,
        ) -> Result<Option<GeneratedImage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_instruction.lock().unwrap() = Some(instruction.to_string());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.reply {
                Reply::Image(data) => Ok(Some(GeneratedImage::new("image/png", data))),
                Reply::Nothing => Ok(None),
                Reply::InvalidKey => Err(StudioError::InvalidApiKey),
                Reply::Failed => Err(StudioError::GenerationFailed("quota".into())),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn upload(name: &str) -> ImageSource {
        ImageSource::File(UploadedImage {
            name: name.into(),
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        })
    }

    fn studio(reply: Reply) -> Studio<FakeEditor> {
        Studio::new(FakeEditor::new(reply), reqwest::Client::new())
    }

    fn en() -> Translator {
        Translator::new(Language::En)
    }

    fn selection(studio: &Studio<FakeEditor>) -> Selection {
        studio.state().selection().cloned().expect("an image is selected")
    }

    #[tokio::test]
    async fn test_submit_without_image_never_calls_editor() {
        let studio = studio(Reply::Image("YWJj"));
        studio.set_instruction("add plants");

        let outcome = studio.submit(Some("key"), &en()).await;
        assert_eq!(outcome, SubmitOutcome::Rejected);
        assert_eq!(studio.editor().calls(), 0);
        assert_eq!(
            studio.validation_error().as_deref(),
            Some("Please select an image first.")
        );
        assert_eq!(studio.state(), StudioState::NoImage);
    }

    #[tokio::test]
    async fn test_successful_edit_stores_exact_bytes() {
        let studio = studio(Reply::Image("iVBORw0KGgo="));
        studio.select_image(upload("room.png"));
        studio.set_instruction("add plants");

        assert_eq!(studio.submit(Some("key"), &en()).await, SubmitOutcome::Completed);

        let selection = selection(&studio);
        assert!(!selection.pending);
        assert!(selection.error.is_none());
        assert_eq!(
            selection.result.unwrap().decode().unwrap(),
            vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
        );
    }

    #[tokio::test]
    async fn test_soft_failure_sets_no_image_message() {
        let studio = studio(Reply::Nothing);
        studio.select_image(upload("room.png"));
        studio.set_instruction("add plants");
        studio.submit(Some("key"), &en()).await;

        let selection = selection(&studio);
        assert!(selection.result.is_none());
        assert_eq!(
            selection.error.as_deref(),
            Some("The model did not return an image. Please try a different prompt.")
        );
    }

    #[tokio::test]
    async fn test_invalid_key_gets_dedicated_message() {
        let studio = studio(Reply::InvalidKey);
        studio.select_image(upload("room.png"));
        studio.set_instruction("add plants");
        studio.submit(Some("bad"), &en()).await;

        assert_eq!(
            selection(&studio).error.as_deref(),
            Some("Your Gemini API key is not valid. Please check it and try again.")
        );
    }

    #[tokio::test]
    async fn test_generic_failure_gets_retry_message() {
        let studio = studio(Reply::Failed);
        studio.select_image(upload("room.png"));
        studio.set_instruction("add plants");
        studio.submit(Some("key"), &en()).await;

        assert_eq!(
            selection(&studio).error.as_deref(),
            Some("Failed to generate the image. Please check the prompt or try a different image.")
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_reported_without_call() {
        let studio = studio(Reply::Image("YWJj"));
        studio.select_image(upload("room.png"));
        studio.set_instruction("add plants");

        assert_eq!(studio.submit(None, &en()).await, SubmitOutcome::Rejected);
        assert_eq!(studio.editor().calls(), 0);
        assert_eq!(
            selection(&studio).error.as_deref(),
            Some("API key is not configured.")
        );
    }

    #[tokio::test]
    async fn test_selection_resets_result_and_error() {
        let studio = studio(Reply::Failed);
        studio.select_image(upload("first.png"));
        studio.set_instruction("add plants");
        studio.submit(Some("key"), &en()).await;
        assert!(selection(&studio).error.is_some());

        let gallery = ImageSelector.select_gallery(1).unwrap();
        studio.select_image(gallery.clone());

        let selection = selection(&studio);
        assert_eq!(selection.original, gallery);
        assert!(selection.result.is_none());
        assert!(selection.error.is_none());
    }

    #[tokio::test]
    async fn test_submit_while_pending_is_ignored() {
        let gate = Arc::new(Notify::new());
        let studio = Studio::new(
            FakeEditor::gated(Reply::Image("YWJj"), gate.clone()),
            reqwest::Client::new(),
        );
        studio.select_image(upload("room.png"));
        studio.set_instruction("add plants");
        let t = en();

        let first = studio.submit(Some("key"), &t);
        let second = async {
            while !studio.is_pending() {
                tokio::task::yield_now().await;
            }
            assert!(!studio.can_submit());
            let outcome = studio.submit(Some("key"), &t).await;
            gate.notify_one();
            outcome
        };

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first, SubmitOutcome::Completed);
        assert_eq!(second, SubmitOutcome::Ignored);
        assert_eq!(studio.editor().calls(), 1);
        assert!(!studio.is_pending());
    }

    #[tokio::test]
    async fn test_late_result_for_old_selection_is_discarded() {
        let gate = Arc::new(Notify::new());
        let studio = Studio::new(
            FakeEditor::gated(Reply::Image("YWJj"), gate.clone()),
            reqwest::Client::new(),
        );
        studio.select_image(upload("old.png"));
        studio.set_instruction("add plants");
        let t = en();

        let first = studio.submit(Some("key"), &t);
        let reselect = async {
            while !studio.is_pending() {
                tokio::task::yield_now().await;
            }
            studio.select_image(upload("new.png"));
            gate.notify_one();
        };

        let (outcome, ()) = tokio::join!(first, reselect);
        assert_eq!(outcome, SubmitOutcome::Discarded);

        let selection = selection(&studio);
        assert_eq!(selection.original, upload("new.png"));
        assert!(!selection.pending);
        assert!(selection.result.is_none());
    }

    #[tokio::test]
    async fn test_gallery_scenario_sends_composed_instruction() {
        let studio = studio(Reply::Image("YWJj"));
        studio.select_image(ImageSelector.select_gallery(3).unwrap());
        studio.toggle_style(StylePreset::Coastal);
        studio.set_instruction("add large windows");

        assert!(studio.can_submit());
        assert_eq!(studio.instruction(), "Coastal style: add large windows");
    }

    #[tokio::test]
    async fn test_editor_receives_style_prefixed_instruction() {
        let studio = studio(Reply::Image("YWJj"));
        studio.select_image(upload("room.png"));
        studio.toggle_style(StylePreset::Coastal);
        studio.set_instruction("add large windows");
        studio.submit(Some("key"), &en()).await;

        assert_eq!(
            studio.editor().last_instruction.lock().unwrap().as_deref(),
            Some("Coastal style: add large windows")
        );
    }

    #[tokio::test]
    async fn test_unreachable_remote_image_is_generic_failure() {
        let studio = studio(Reply::Image("YWJj"));
        studio.select_image(ImageSource::Url("http://127.0.0.1:9/room.jpeg".into()));
        studio.set_instruction("add plants");

        assert_eq!(studio.submit(Some("key"), &en()).await, SubmitOutcome::Completed);
        assert_eq!(studio.editor().calls(), 0);

        let selection = selection(&studio);
        assert!(!selection.pending);
        assert!(selection.result.is_none());
        assert_eq!(
            selection.error.as_deref(),
            Some("Failed to generate the image. Please check the prompt or try a different image.")
        );
    }
}
