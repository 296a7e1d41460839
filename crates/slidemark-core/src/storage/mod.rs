//! Tutorial persistence.
//!
//! Conversion between the in-memory [`Tutorial`](crate::tutorial::Tutorial)
//! and its documents is pure (see [`to_document`] / [`from_document`]);
//! backends only move bytes and images.

mod capture;
mod convert;
mod file;
mod memory;
mod schema;
mod store;
mod text_dict;

pub use capture::import_capture;
pub use convert::{
    LoadOutcome, from_document, from_legacy, slide_prefix, to_document, to_logical_image,
};
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use schema::{
    AnnotationRecord, CaptureManifest, CaptureWindow, DocumentFormat, LegacyDocument,
    LegacySlideRecord, PenRecord, SlideRecord, TutorialDocument, VERSION_KEY, parse_document,
    split_slide_code,
};
pub use store::{DocumentState, SaveReport, TutorialStore, load_tutorial, save_tutorial};
pub use text_dict::{DEFAULT_TEXT_DICT, TextDictionary};

use crate::error::{ResourceError, SchemaError};
use crate::slide::SlideLayout;
use crate::widget::WidgetSidecar;
use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Size of generated pages when no template image exists.
pub const DEFAULT_PAGE_SIZE: (u32, u32) = (900, 530);

/// A white page.
pub fn blank_page((width, height): (u32, u32)) -> RgbaImage {
    RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([255, 255, 255, 255]))
}

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Images and sidecars a load resolves slides against.
pub trait AssetSource {
    /// One raw window capture, paths relative to the raw capture root.
    fn raw_window(
        &self,
        image: &str,
        metadata: &str,
    ) -> Result<(RgbaImage, WidgetSidecar), ResourceError>;

    /// Window `window` of capture step `step` (`Raw/<step>/<window>.png|.json`).
    fn window_capture(
        &self,
        step: &str,
        window: &str,
    ) -> Result<(RgbaImage, WidgetSidecar), ResourceError> {
        self.raw_window(
            &format!("{step}/{window}.png"),
            &format!("{step}/{window}.json"),
        )
    }

    /// Every sidecar in one step directory, in file-name order.
    fn step_sidecars(&self, step: &str) -> Result<Vec<WidgetSidecar>, ResourceError>;

    /// A slide image written by a previous save.
    fn rendered_slide(&self, image_path: &str) -> Result<RgbaImage, ResourceError>;

    /// Background for a page without captures.
    fn layout_background(&self, layout: SlideLayout) -> Result<RgbaImage, ResourceError>;
}

/// A place tutorials are read from and written to.
pub trait Storage: AssetSource {
    /// The tutorial document (`annotations.json`).
    fn read_document(&self) -> StorageResult<String>;

    fn write_document(&self, json: &str) -> StorageResult<()>;

    /// Text dictionary for `locale`, falling back to the default one.
    fn read_text(&self, locale: Option<&str>) -> StorageResult<TextDictionary>;

    /// Write the default text dictionary.
    fn write_text(&self, text: &TextDictionary) -> StorageResult<()>;

    fn write_slide_image(&self, image_path: &str, image: &RgbaImage) -> StorageResult<()>;

    /// The raw capture manifest.
    fn read_manifest(&self) -> StorageResult<String>;
}
