//! Composition root: wires the stores and the studio together.

use crate::credential::CredentialStore;
use crate::gallery::{ImageSelector, GALLERY};
use crate::i18n::{Language, Translator};
use crate::image::ImageEditor;
use crate::session::Session;
use crate::studio::{Studio, StudioState, SubmitOutcome};
use std::fmt::Write as _;
use std::path::Path;

/// Which top-level screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// No API key stored: only the setup prompt is shown.
    CredentialSetup,
    /// The editing workflow.
    Main,
}

/// The application: explicit services instead of ambient globals.
pub struct App<E> {
    credentials: CredentialStore,
    translator: Translator,
    session: Session,
    selector: ImageSelector,
    studio: Studio<E>,
}

impl<E: ImageEditor> App<E> {
    /// Assembles the app. The session starts with the sample user.
    pub fn new(
        credentials: CredentialStore,
        editor: E,
        http: reqwest::Client,
        language: Language,
    ) -> Self {
        Self {
            credentials,
            translator: Translator::new(language),
            session: Session::with_sample_user(),
            selector: ImageSelector,
            studio: Studio::new(editor, http),
        }
    }

    /// Returns the screen to show; the setup prompt wins whenever no key is stored.
    pub fn screen(&self) -> Screen {
        if self.credentials.is_set() {
            Screen::Main
        } else {
            Screen::CredentialSetup
        }
    }

    /// Returns the credential store.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Returns the translator.
    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Switches the UI language.
    pub fn set_language(&mut self, language: Language) {
        self.translator.set_language(language);
    }

    /// Returns the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the session for login/logout.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Returns the studio.
    pub fn studio(&self) -> &Studio<E> {
        &self.studio
    }

    /// Saves the key typed into the setup prompt.
    pub fn submit_setup(&self, entry: &str) -> Result<(), String> {
        self.credentials.submit_setup(entry, &self.translator)
    }

    /// The menu's "Change API Key" action: forgets the key so setup shows again.
    pub fn change_api_key(&self) -> crate::Result<()> {
        self.credentials.clear()
    }

    /// Selects gallery item `id`. Returns false for an unknown id.
    pub fn select_gallery(&self, id: u32) -> bool {
        match self.selector.select_gallery(id) {
            Some(image) => {
                self.studio.select_image(image);
                true
            }
            None => false,
        }
    }

    /// Drops files onto the selector. Returns false when none was accepted.
    pub fn drop_files<P: AsRef<Path>>(&self, paths: &[P]) -> crate::Result<bool> {
        match self.selector.drop_files(paths)? {
            Some(image) => {
                self.studio.select_image(image);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Submits the composed edit using the stored key.
    pub async fn generate(&self) -> SubmitOutcome {
        let key = self.credentials.get();
        self.studio.submit(key.as_deref(), &self.translator).await
    }

    /// Renders the current screen as text.
    pub fn render(&self) -> String {
        let t = &self.translator;
        let mut out = String::new();

        if self.screen() == Screen::CredentialSetup {
            let _ = writeln!(out, "{}", t.lookup("api_key_modal_title"));
            let _ = writeln!(out, "{}", t.lookup("api_key_modal_description"));
            return out;
        }

        let _ = write!(out, "{}", t.lookup("app_title"));
        match self.session.user() {
            Some(user) => {
                let _ = writeln!(out, " | {} <{}>", user.name, user.email);
            }
            None => out.push('\n'),
        }

        match self.studio.state() {
            StudioState::NoImage => {
                let _ = writeln!(out, "{}", t.lookup("image_selector_title"));
                let _ = writeln!(out, "{}", t.lookup("image_selector_gallery_title"));
                for item in &GALLERY {
                    let _ = writeln!(out, "  [{}] {}", item.id, item.alt);
                }
            }
            StudioState::ImageSelected(selection) => {
                let _ = write!(out, "{}", self.studio.comparison(t));
                if let Some(style) = self.studio.style() {
                    let _ = writeln!(out, "{}: {}", t.lookup("style_label"), style.localized(t));
                }
                if selection.pending {
                    let _ = writeln!(out, "{}", t.lookup("generating_button"));
                }
                if let Some(error) = selection.error {
                    let _ = writeln!(out, "{}: {}", t.lookup("error_title"), error);
                }
            }
        }
        if let Some(message) = self.studio.validation_error() {
            let _ = writeln!(out, "{message}");
        }
        out
    }
}
