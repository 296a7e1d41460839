//! File-based storage.
//!
//! Layout under the output directory:
//!
//! ```text
//! Raw/Tutorial.json                  capture manifest
//! Raw/<step>/<window>.png|.json      window captures and sidecars
//! Annotations/annotations.json       tutorial document
//! Annotations/text_dict_*.json       text dictionaries
//! Annotations/<ImagePath>            rendered slides
//! ```

use super::{AssetSource, Storage, StorageError, StorageResult, TextDictionary, blank_page};
use crate::config::AnnotatorConfig;
use crate::error::ResourceError;
use crate::slide::SlideLayout;
use crate::widget::WidgetSidecar;
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the tutorial document.
pub const DOCUMENT_FILE: &str = "annotations.json";
/// File name of the raw capture manifest.
pub const MANIFEST_FILE: &str = "Tutorial.json";

/// Template image for a page layout.
fn template_file(layout: SlideLayout) -> &'static str {
    match layout {
        SlideLayout::Cover => "cover_page.png",
        SlideLayout::Acknowledgment => "Acknowledgments.png",
        SlideLayout::Screenshot | SlideLayout::Blank => "white.png",
    }
}

/// File-based storage for native platforms.
pub struct FileStorage {
    output_dir: PathBuf,
    templates_dir: PathBuf,
    blank_page_size: (u32, u32),
}

impl FileStorage {
    /// Create storage rooted at `output_dir`.
    ///
    /// Creates the `Annotations/` directory if it doesn't exist.
    pub fn new(output_dir: PathBuf, templates_dir: PathBuf) -> StorageResult<Self> {
        let storage = Self {
            output_dir,
            templates_dir,
            blank_page_size: super::DEFAULT_PAGE_SIZE,
        };
        let annotations = storage.annotations_dir();
        if !annotations.exists() {
            fs::create_dir_all(&annotations).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(storage)
    }

    pub fn from_config(config: &AnnotatorConfig) -> StorageResult<Self> {
        Ok(Self::new(config.output_dir.clone(), config.templates_dir.clone())?
            .with_blank_page_size(config.blank_page_size))
    }

    pub fn with_blank_page_size(mut self, size: (u32, u32)) -> Self {
        self.blank_page_size = size;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.output_dir.join("Raw")
    }

    pub fn annotations_dir(&self) -> PathBuf {
        self.output_dir.join("Annotations")
    }

    fn read_string(path: &Path) -> StorageResult<String> {
        if !path.exists() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }
        fs::read_to_string(path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
    }

    fn write_string(path: &Path, contents: &str) -> StorageResult<()> {
        fs::write(path, contents)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }
}

fn read_image(path: &Path) -> Result<RgbaImage, ResourceError> {
    match image::open(path) {
        Ok(image) => Ok(image.to_rgba8()),
        Err(image::ImageError::IoError(e)) => Err(ResourceError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
        Err(e) => Err(ResourceError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

fn read_sidecar(path: &Path) -> Result<WidgetSidecar, ResourceError> {
    let json = fs::read_to_string(path).map_err(|e| ResourceError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    WidgetSidecar::from_json(&json).map_err(|e| ResourceError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

impl AssetSource for FileStorage {
    fn raw_window(
        &self,
        image: &str,
        metadata: &str,
    ) -> Result<(RgbaImage, WidgetSidecar), ResourceError> {
        let raw = self.raw_dir();
        let sidecar = read_sidecar(&raw.join(metadata))?;
        let image = read_image(&raw.join(image))?;
        Ok((image, sidecar))
    }

    fn step_sidecars(&self, step: &str) -> Result<Vec<WidgetSidecar>, ResourceError> {
        let dir = self.raw_dir().join(step);
        let entries = fs::read_dir(&dir).map_err(|e| ResourceError::Unreadable {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().map(|e| e == "json").unwrap_or(false))
            .collect();
        paths.sort();
        paths.iter().map(|path| read_sidecar(path)).collect()
    }

    fn rendered_slide(&self, image_path: &str) -> Result<RgbaImage, ResourceError> {
        read_image(&self.annotations_dir().join(image_path))
    }

    fn layout_background(&self, layout: SlideLayout) -> Result<RgbaImage, ResourceError> {
        let path = self.templates_dir.join(template_file(layout));
        if path.exists() {
            return read_image(&path);
        }
        log::warn!(
            "Template {} missing, generating a blank page",
            path.display()
        );
        Ok(blank_page(self.blank_page_size))
    }
}

impl Storage for FileStorage {
    fn read_document(&self) -> StorageResult<String> {
        Self::read_string(&self.annotations_dir().join(DOCUMENT_FILE))
    }

    fn write_document(&self, json: &str) -> StorageResult<()> {
        Self::write_string(&self.annotations_dir().join(DOCUMENT_FILE), json)
    }

    fn read_text(&self, locale: Option<&str>) -> StorageResult<TextDictionary> {
        let dir = self.annotations_dir();
        let localized = dir.join(TextDictionary::file_name(locale));
        let path = if localized.exists() {
            localized
        } else {
            log::warn!("{} doesn't exist, loading default", localized.display());
            dir.join(TextDictionary::file_name(None))
        };
        if !path.exists() {
            log::warn!("No text dictionary in {}", dir.display());
            return Ok(TextDictionary::new());
        }
        Ok(TextDictionary::from_json(&Self::read_string(&path)?)?)
    }

    fn write_text(&self, text: &TextDictionary) -> StorageResult<()> {
        let path = self.annotations_dir().join(TextDictionary::file_name(None));
        Self::write_string(&path, &text.to_json()?)
    }

    fn write_slide_image(&self, image_path: &str, image: &RgbaImage) -> StorageResult<()> {
        let path = self.annotations_dir().join(image_path);
        image
            .save(&path)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn read_manifest(&self) -> StorageResult<String> {
        Self::read_string(&self.raw_dir().join(MANIFEST_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    fn storage(dir: &Path) -> FileStorage {
        FileStorage::new(dir.join("Outputs"), dir.join("templates")).unwrap()
    }

    fn write_window(storage: &FileStorage, step: &str, window: &str, sidecar: &str) {
        let dir = storage.raw_dir().join(step);
        fs::create_dir_all(&dir).unwrap();
        RgbaImage::from_pixel(8, 6, Rgba([9, 9, 9, 255]))
            .save(dir.join(format!("{window}.png")))
            .unwrap();
        fs::write(dir.join(format!("{window}.json")), sidecar).unwrap();
    }

    const SIDECAR: &str =
        r#"{"0": {"name":"w","path":"W","text":"","position":[0,0],"size":[8,6]}}"#;

    #[test]
    fn test_new_creates_annotations_dir() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path());
        assert!(storage.annotations_dir().is_dir());
    }

    #[test]
    fn test_window_capture_from_disk() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path());
        write_window(&storage, "0", "0", SIDECAR);

        let (image, sidecar) = storage.window_capture("0", "0").unwrap();
        assert_eq!(image.dimensions(), (8, 6));
        assert_eq!(sidecar.widgets[0].path, "W");
        assert!(matches!(
            storage.window_capture("0", "1"),
            Err(ResourceError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_corrupt_image_is_decode_error() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path());
        write_window(&storage, "0", "0", SIDECAR);
        fs::write(storage.raw_dir().join("0").join("0.png"), b"not a png").unwrap();
        assert!(matches!(
            storage.window_capture("0", "0"),
            Err(ResourceError::Decode { .. })
        ));
    }

    #[test]
    fn test_step_sidecars_sorted() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path());
        write_window(&storage, "2", "1", SIDECAR);
        write_window(
            &storage,
            "2",
            "0",
            r#"{"0": {"name":"x","path":"X","text":"","position":[0,0],"size":[1,1]}}"#,
        );
        let sidecars = storage.step_sidecars("2").unwrap();
        assert_eq!(sidecars.len(), 2);
        assert_eq!(sidecars[0].widgets[0].path, "X");
    }

    #[test]
    fn test_templates_and_blank_fallback() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).with_blank_page_size((30, 20));
        assert_eq!(
            storage.layout_background(SlideLayout::Blank).unwrap().dimensions(),
            (30, 20)
        );

        fs::create_dir_all(dir.path().join("templates")).unwrap();
        RgbaImage::new(5, 5)
            .save(dir.path().join("templates").join("cover_page.png"))
            .unwrap();
        assert_eq!(
            storage.layout_background(SlideLayout::Cover).unwrap().dimensions(),
            (5, 5)
        );
    }

    #[test]
    fn test_document_and_text() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path());
        assert!(matches!(
            storage.read_document(),
            Err(StorageError::NotFound(_))
        ));
        storage.write_document("{\"slides\": []}").unwrap();
        assert_eq!(storage.read_document().unwrap(), "{\"slides\": []}");

        let mut text = TextDictionary::new();
        text.insert("0_slide_title", "Hola");
        storage.write_text(&text).unwrap();
        assert!(storage.annotations_dir().join("text_dict_default.json").exists());
        assert_eq!(storage.read_text(Some("de")).unwrap(), text);
    }

    #[test]
    fn test_slide_image_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path());
        let image = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        storage.write_slide_image("0_slide.png", &image).unwrap();
        assert_eq!(storage.rendered_slide("0_slide.png").unwrap(), image);
    }
}
