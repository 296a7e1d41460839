//! In-memory storage implementation.

use super::{AssetSource, Storage, StorageError, StorageResult, TextDictionary, blank_page};
use crate::error::ResourceError;
use crate::slide::SlideLayout;
use crate::widget::WidgetSidecar;
use image::RgbaImage;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::RwLock;

/// In-memory storage for testing and headless use.
#[derive(Default)]
pub struct MemoryStorage {
    document: RwLock<Option<String>>,
    manifest: RwLock<Option<String>>,
    /// Keyed by dictionary file name.
    text: RwLock<HashMap<String, TextDictionary>>,
    slide_images: RwLock<HashMap<String, RgbaImage>>,
    raw_images: RwLock<HashMap<String, RgbaImage>>,
    raw_sidecars: RwLock<BTreeMap<String, String>>,
    templates: RwLock<HashMap<SlideLayout, RgbaImage>>,
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

fn resource_lock_error(e: impl std::fmt::Display) -> ResourceError {
    ResourceError::Other(format!("Lock error: {}", e))
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw capture under explicit relative paths.
    pub fn insert_raw(&self, image_path: &str, image: RgbaImage, metadata_path: &str, sidecar: &str) {
        if let Ok(mut images) = self.raw_images.write() {
            images.insert(image_path.to_string(), image);
        }
        if let Ok(mut sidecars) = self.raw_sidecars.write() {
            sidecars.insert(metadata_path.to_string(), sidecar.to_string());
        }
    }

    /// Add window `window` of step `step`.
    pub fn insert_window(&self, step: usize, window: usize, image: RgbaImage, sidecar: &str) {
        self.insert_raw(
            &format!("{step}/{window}.png"),
            image,
            &format!("{step}/{window}.json"),
            sidecar,
        );
    }

    pub fn set_document(&self, json: impl Into<String>) {
        if let Ok(mut document) = self.document.write() {
            *document = Some(json.into());
        }
    }

    pub fn document(&self) -> Option<String> {
        self.document.read().ok()?.clone()
    }

    pub fn set_manifest(&self, json: impl Into<String>) {
        if let Ok(mut manifest) = self.manifest.write() {
            *manifest = Some(json.into());
        }
    }

    pub fn insert_text(&self, locale: Option<&str>, text: TextDictionary) {
        if let Ok(mut dicts) = self.text.write() {
            dicts.insert(TextDictionary::file_name(locale), text);
        }
    }

    pub fn insert_template(&self, layout: SlideLayout, image: RgbaImage) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(layout, image);
        }
    }

    pub fn insert_slide_image(&self, image_path: &str, image: RgbaImage) {
        if let Ok(mut images) = self.slide_images.write() {
            images.insert(image_path.to_string(), image);
        }
    }

    pub fn slide_image(&self, image_path: &str) -> Option<RgbaImage> {
        self.slide_images.read().ok()?.get(image_path).cloned()
    }

    fn sidecar(&self, metadata_path: &str) -> Result<WidgetSidecar, ResourceError> {
        let sidecars = self.raw_sidecars.read().map_err(resource_lock_error)?;
        let json = sidecars
            .get(metadata_path)
            .ok_or_else(|| ResourceError::Unreadable {
                path: PathBuf::from(metadata_path),
                reason: "not found".into(),
            })?;
        WidgetSidecar::from_json(json).map_err(|e| ResourceError::Decode {
            path: PathBuf::from(metadata_path),
            reason: e.to_string(),
        })
    }
}

impl AssetSource for MemoryStorage {
    fn raw_window(
        &self,
        image: &str,
        metadata: &str,
    ) -> Result<(RgbaImage, WidgetSidecar), ResourceError> {
        let sidecar = self.sidecar(metadata)?;
        let images = self.raw_images.read().map_err(resource_lock_error)?;
        let image = images
            .get(image)
            .cloned()
            .ok_or_else(|| ResourceError::Unreadable {
                path: PathBuf::from(image),
                reason: "not found".into(),
            })?;
        Ok((image, sidecar))
    }

    fn step_sidecars(&self, step: &str) -> Result<Vec<WidgetSidecar>, ResourceError> {
        let prefix = format!("{step}/");
        let keys: Vec<String> = {
            let sidecars = self.raw_sidecars.read().map_err(resource_lock_error)?;
            sidecars
                .keys()
                .filter(|key| key.starts_with(&prefix) && key.ends_with(".json"))
                .cloned()
                .collect()
        };
        if keys.is_empty() {
            return Err(ResourceError::Unreadable {
                path: PathBuf::from(step),
                reason: "no sidecars".into(),
            });
        }
        keys.iter().map(|key| self.sidecar(key)).collect()
    }

    fn rendered_slide(&self, image_path: &str) -> Result<RgbaImage, ResourceError> {
        self.slide_image(image_path)
            .ok_or_else(|| ResourceError::Unreadable {
                path: PathBuf::from(image_path),
                reason: "not found".into(),
            })
    }

    fn layout_background(&self, layout: SlideLayout) -> Result<RgbaImage, ResourceError> {
        let templates = self.templates.read().map_err(resource_lock_error)?;
        Ok(templates
            .get(&layout)
            .cloned()
            .unwrap_or_else(|| blank_page(super::DEFAULT_PAGE_SIZE)))
    }
}

impl Storage for MemoryStorage {
    fn read_document(&self) -> StorageResult<String> {
        self.document
            .read()
            .map_err(lock_error)?
            .clone()
            .ok_or_else(|| StorageError::NotFound("annotations.json".into()))
    }

    fn write_document(&self, json: &str) -> StorageResult<()> {
        *self.document.write().map_err(lock_error)? = Some(json.to_string());
        Ok(())
    }

    fn read_text(&self, locale: Option<&str>) -> StorageResult<TextDictionary> {
        let dicts = self.text.read().map_err(lock_error)?;
        if let Some(text) = dicts.get(&TextDictionary::file_name(locale)) {
            return Ok(text.clone());
        }
        if locale.is_some() {
            log::warn!("No text dictionary for locale {locale:?}, using default");
        }
        Ok(dicts
            .get(&TextDictionary::file_name(None))
            .cloned()
            .unwrap_or_default())
    }

    fn write_text(&self, text: &TextDictionary) -> StorageResult<()> {
        self.text
            .write()
            .map_err(lock_error)?
            .insert(TextDictionary::file_name(None), text.clone());
        Ok(())
    }

    fn write_slide_image(&self, image_path: &str, image: &RgbaImage) -> StorageResult<()> {
        self.slide_images
            .write()
            .map_err(lock_error)?
            .insert(image_path.to_string(), image.clone());
        Ok(())
    }

    fn read_manifest(&self) -> StorageResult<String> {
        self.manifest
            .read()
            .map_err(lock_error)?
            .clone()
            .ok_or_else(|| StorageError::NotFound("Tutorial.json".into()))
    }
}
