//! Image source selection: sample gallery and file drop target.

use crate::error::{Result, StudioError};
use crate::image::{ImageFormat, ImagePayload};
use std::path::Path;

/// Extensions the drop target accepts.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpeg", "png", "jpg", "webp"];

/// A sample room photo hosted remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryItem {
    /// 1-based id.
    pub id: u32,
    /// Public image URL.
    pub src: &'static str,
    /// Short description.
    pub alt: &'static str,
}

/// The fixed sample gallery.
pub static GALLERY: [GalleryItem; 6] = [
    GalleryItem {
        id: 1,
        src: "https://storage.googleapis.com/gemini-ui-params/demo/img/gallery/modern_1.jpeg",
        alt: "Modern living room",
    },
    GalleryItem {
        id: 2,
        src: "https://storage.googleapis.com/gemini-ui-params/demo/img/gallery/minimalist_1.jpeg",
        alt: "Minimalist bedroom",
    },
    GalleryItem {
        id: 3,
        src: "https://storage.googleapis.com/gemini-ui-params/demo/img/gallery/bohemian_1.jpeg",
        alt: "Bohemian dining area",
    },
    GalleryItem {
        id: 4,
        src: "https://storage.googleapis.com/gemini-ui-params/demo/img/gallery/industrial_1.jpeg",
        alt: "Industrial kitchen",
    },
    GalleryItem {
        id: 5,
        src: "https://storage.googleapis.com/gemini-ui-params/demo/img/gallery/coastal_1.jpeg",
        alt: "Coastal bathroom",
    },
    GalleryItem {
        id: 6,
        src: "https://storage.googleapis.com/gemini-ui-params/demo/img/gallery/farmhouse_1.jpeg",
        alt: "Farmhouse living room",
    },
];

/// Looks up a gallery item by id.
pub fn gallery_item(id: u32) -> Option<&'static GalleryItem> {
    GALLERY.iter().find(|item| item.id == id)
}

/// A local file accepted by the drop target.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// File name as dropped.
    pub name: String,
    /// MIME type derived from the extension.
    pub mime_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedImage")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedImage {
    /// Reads an accepted image file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = accepted_format(path)
            .ok_or_else(|| StudioError::UnsupportedFile(path.display().to_string()))?;
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            mime_type: format.mime_type().to_string(),
            bytes,
        })
    }
}

/// The image currently being worked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A remote image (gallery entry).
    Url(String),
    /// An uploaded local file.
    File(UploadedImage),
}

impl ImageSource {
    /// Returns a short reference for display (URL or file name).
    pub fn display_ref(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::File(file) => &file.name,
        }
    }

    /// Encodes the image as base64, fetching it first if it is remote.
    pub async fn to_payload(&self, http: &reqwest::Client) -> Result<ImagePayload> {
        match self {
            Self::File(file) => Ok(ImagePayload::from_bytes(&file.bytes, file.mime_type.clone())),
            Self::Url(url) => {
                tracing::debug!(url = %url, "fetching remote image");
                let response = http.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(StudioError::Api {
                        status: status.as_u16(),
                        message: format!("failed to fetch {url}"),
                    });
                }
                let header_mime = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(ImageFormat::from_mime_type);
                let bytes = response.bytes().await?;
                let format = header_mime
                    .or_else(|| ImageFormat::from_magic_bytes(&bytes))
                    .or_else(|| accepted_format(Path::new(url)))
                    .unwrap_or(ImageFormat::Jpeg);
                Ok(ImagePayload::from_bytes(&bytes, format.mime_type()))
            }
        }
    }
}

/// Returns the format for a path whose extension passes the accept filter.
pub fn accepted_format(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    ImageFormat::from_extension(&ext)
}

/// Turns gallery clicks and file drops into selections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSelector;

impl ImageSelector {
    /// Selects gallery item `id`. Unknown ids select nothing.
    pub fn select_gallery(&self, id: u32) -> Option<ImageSource> {
        gallery_item(id).map(|item| ImageSource::Url(item.src.to_string()))
    }

    /// Handles a drop of one or more files.
    ///
    /// Files failing the accept filter are rejected; the first accepted file
    /// wins. `Ok(None)` means nothing was accepted and no selection happens.
    pub fn drop_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Option<ImageSource>> {
        let Some(first) = paths
            .iter()
            .map(AsRef::<Path>::as_ref)
            .find(|p| accepted_format(p).is_some())
        else {
            tracing::debug!(count = paths.len(), "drop rejected, no accepted image files");
            return Ok(None);
        };
        if paths.len() > 1 {
            tracing::debug!(count = paths.len(), "multiple files dropped, keeping the first accepted");
        }
        UploadedImage::from_path(first).map(|file| Some(ImageSource::File(file)))
    }
}
