#![warn(missing_docs)]
//! Virtual Architect Studio - restyle room photos with Gemini image editing.
//!
//! Pick a room photo (a local file or one of the sample gallery images),
//! optionally a style preset, describe the changes, and the studio sends the
//! image and instruction to Gemini and shows the edited result next to the
//! original.
//!
//! # Quick Start
//!
//! ```no_run
//! use archstudio::{
//!     App, CredentialStore, FileStore, GeminiClient, Language, StylePreset, SubmitOutcome,
//! };
//!
//! #[tokio::main]
//! async fn main() -> archstudio::Result<()> {
//!     let credentials = CredentialStore::load(FileStore::open_default()?)?;
//!     let client = GeminiClient::builder().build()?;
//!     let http = client.http().clone();
//!     let app = App::new(credentials, client, http, Language::En);
//!
//!     app.select_gallery(3);
//!     app.studio().toggle_style(StylePreset::Coastal);
//!     app.studio().set_instruction("add large windows");
//!
//!     if app.generate().await == SubmitOutcome::Completed {
//!         println!("{}", app.render());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `archstudio` command-line interface

mod app;
mod composer;
mod credential;
mod error;
pub mod gallery;
pub mod i18n;
pub mod image;
mod session;
mod studio;
mod viewer;

// Re-export error types at crate root
pub use error::{Result, StudioError};

pub use app::{App, Screen};
pub use composer::{compose_instruction, Composer, EditRequest, PendingEdit, StylePreset};
pub use credential::{
    default_data_dir, CredentialStore, FileStore, KeyValueStore, MemoryStore, API_KEY_STORAGE_KEY,
    DATA_DIR_ENV,
};
pub use gallery::{GalleryItem, ImageSelector, ImageSource, UploadedImage, GALLERY};
pub use i18n::{Language, Translator};
pub use image::{
    GeminiClient, GeminiClientBuilder, GeminiModel, GeneratedImage, ImageEditor, ImageFormat,
    ImagePayload,
};
pub use session::{Session, User};
pub use studio::{Selection, Studio, StudioState, SubmitOutcome};
pub use viewer::{Comparison, Pane, PaneContent};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, StudioError};
    pub use crate::{
        App, CredentialStore, FileStore, GeminiClient, GeneratedImage, ImageEditor, ImageSource,
        Language, MemoryStore, StylePreset, Studio, SubmitOutcome, Translator,
    };
}
