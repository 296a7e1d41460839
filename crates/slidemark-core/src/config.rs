//! Annotator settings.

use crate::annotations::{GeometryConfig, PenStyle};
use crate::error::SchemaError;
use crate::storage::{DEFAULT_PAGE_SIZE, StorageError, StorageResult};
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-user settings file.
pub const CONFIG_FILE_NAME: &str = "slidemark.json";

/// User-adjustable settings. Every field falls back to its default when
/// missing from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    pub geometry: GeometryConfig,
    /// Pen used for new annotations.
    pub default_pen: PenStyle,
    /// Display-space distance of the direction handle from the pointer when
    /// an annotation is started. Flipped toward the view centre.
    pub helper_offset: Vec2,
    /// Locale of the text dictionary to load; `None` loads the default one.
    pub locale: Option<String>,
    /// Holds `Raw/` captures and `Annotations/` output.
    pub output_dir: PathBuf,
    /// Holds page templates (`cover_page.png`, `Acknowledgments.png`, `white.png`).
    pub templates_dir: PathBuf,
    /// Size of generated pages when a template is missing.
    pub blank_page_size: (u32, u32),
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        let data = default_data_dir();
        Self {
            geometry: GeometryConfig::default(),
            default_pen: PenStyle::default(),
            helper_offset: Vec2::new(60.0, 60.0),
            locale: None,
            output_dir: data.join("Outputs"),
            templates_dir: data.join("Resources").join("NewSlide"),
            blank_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// `<data dir>/slidemark`, or the working directory when the platform has none.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .map(|base| base.join("slidemark"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl AnnotatorConfig {
    /// Default settings file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("slidemark").join(CONFIG_FILE_NAME))
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> StorageResult<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).map_err(|e| {
            StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::from_json(&json)?)
    }

    pub fn save(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(path, self.to_json()?).map_err(|e| {
            StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AnnotatorConfig::from_json(
            r#"{"locale": "es", "geometry": {"arrow_length": 120.0}}"#,
        )
        .unwrap();
        assert_eq!(config.locale.as_deref(), Some("es"));
        assert!((config.geometry.arrow_length - 120.0).abs() < f64::EPSILON);
        assert!((config.geometry.arrow_text_length - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.default_pen, PenStyle::default());
        assert_eq!(config.blank_page_size, (900, 530));
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(AnnotatorConfig::from_json(r#"{"locale": 5}"#).is_err());
    }

    #[test]
    fn test_load_missing_and_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        assert_eq!(AnnotatorConfig::load(&path).unwrap(), AnnotatorConfig::default());

        let mut config = AnnotatorConfig::default();
        config.locale = Some("fr".into());
        config.default_pen = config.default_pen.with_thickness(7);
        config.save(&path).unwrap();
        assert_eq!(AnnotatorConfig::load(&path).unwrap(), config);
    }
}
