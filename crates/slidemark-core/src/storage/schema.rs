//! On-disk JSON records.
//!
//! Field names follow the documents produced by earlier versions of the tool,
//! so existing tutorials keep loading.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level key whose presence marks a current-format document.
pub const VERSION_KEY: &str = "TutorialMaker_version";

/// Current-format tutorial document (`annotations.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub desc: String,
    #[serde(rename = "TutorialMaker_version")]
    pub version: String,
    pub slides: Vec<SlideRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    #[serde(rename = "ImagePath")]
    pub image_path: String,
    /// `"<step>/<window>"` per captured window.
    #[serde(rename = "SlideCode")]
    pub slide_code: Vec<String>,
    #[serde(rename = "SlideLayout")]
    pub layout: String,
    /// Text-dictionary key of the title.
    #[serde(rename = "SlideTitle")]
    pub title_key: String,
    /// Text-dictionary key of the body.
    #[serde(rename = "SlideDesc")]
    pub body_key: String,
    #[serde(rename = "Annotations", default)]
    pub annotations: Vec<AnnotationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    #[serde(rename = "widgetPath")]
    pub widget_path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: [f64; 2],
    pub optional: [f64; 2],
    #[serde(default)]
    pub custom: String,
    #[serde(rename = "penSettings")]
    pub pen: PenRecord,
    /// Text-dictionary key of the annotation text.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenRecord {
    /// `#RRGGBB`.
    pub color: String,
    pub thickness: u32,
    #[serde(rename = "fontSize")]
    pub font_size: u32,
}

/// Document written before the version marker existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub desc: String,
    pub slides: Vec<LegacySlideRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySlideRecord {
    #[serde(rename = "ImagePath")]
    pub image_path: String,
    /// Single `"<step>/<file>"` code.
    #[serde(rename = "SlideCode")]
    pub slide_code: String,
    #[serde(rename = "SlideLayout")]
    pub layout: String,
    #[serde(rename = "SlideTitle")]
    pub title_key: String,
    #[serde(rename = "SlideDesc")]
    pub body_key: String,
    #[serde(rename = "Annotations", default)]
    pub annotations: Vec<AnnotationRecord>,
}

/// A parsed tutorial document of either format.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentFormat {
    Current(TutorialDocument),
    Legacy(LegacyDocument),
}

/// Parse a tutorial document, picking the format by the version marker.
pub fn parse_document(json: &str) -> Result<DocumentFormat, SchemaError> {
    let value: Value = serde_json::from_str(json)?;
    let Some(object) = value.as_object() else {
        return Err(SchemaError::Other("tutorial document must be a JSON object".into()));
    };
    if object.contains_key(VERSION_KEY) {
        Ok(DocumentFormat::Current(serde_json::from_value(value)?))
    } else {
        Ok(DocumentFormat::Legacy(serde_json::from_value(value)?))
    }
}

/// Split a `"<step>/<window>"` code.
pub fn split_slide_code(code: &str) -> Result<(&str, &str), SchemaError> {
    match code.split_once('/') {
        Some((step, window)) if !step.is_empty() && !window.is_empty() => Ok((step, window)),
        _ => Err(SchemaError::BadSlideCode(code.to_string())),
    }
}

/// Raw capture manifest written by the screenshot source (`Raw/Tutorial.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureManifest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub desc: String,
    /// One entry per step, one window per entry of the step.
    pub steps: Vec<Vec<CaptureWindow>>,
}

/// Image and sidecar of one captured window, relative to the raw root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureWindow {
    pub window: String,
    pub metadata: String,
}

impl CaptureManifest {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT: &str = r##"{
        "title": "T", "author": "A", "date": "D", "desc": "",
        "TutorialMaker_version": "1.0",
        "slides": [{
            "ImagePath": "0_Intro.png",
            "SlideCode": ["0/0", "0/1"],
            "SlideLayout": "Screenshot",
            "SlideTitle": "0_Intro_title",
            "SlideDesc": "0_Intro_body",
            "Annotations": [{
                "widgetPath": "Main/Ok", "type": "Arrow",
                "offset": [0, 0], "optional": [10.5, 20],
                "custom": "",
                "penSettings": {"color": "#ff0000", "thickness": 4, "fontSize": 14},
                "text": "0_Arrow_0"
            }]
        }]
    }"##;

    #[test]
    fn test_detects_current_format() {
        let DocumentFormat::Current(doc) = parse_document(CURRENT).unwrap() else {
            panic!("expected current format");
        };
        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.slides[0].slide_code, ["0/0", "0/1"]);
        let ann = &doc.slides[0].annotations[0];
        assert_eq!(ann.kind, "Arrow");
        assert_eq!(ann.optional, [10.5, 20.0]);
        assert_eq!(ann.pen.font_size, 14);
    }

    #[test]
    fn test_detects_legacy_format() {
        let json = r#"{"title":"T","author":"A","date":"D","desc":"",
            "slides":[{"ImagePath":"0_slide.png","SlideCode":"2/1","SlideLayout":"Screenshot",
            "SlideTitle":"0_slide_title","SlideDesc":"0_slide_body","Annotations":[]}]}"#;
        let DocumentFormat::Legacy(doc) = parse_document(json).unwrap() else {
            panic!("expected legacy format");
        };
        assert_eq!(doc.slides[0].slide_code, "2/1");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_document("not json").is_err());
        assert!(parse_document("[]").is_err());
        // Version marker present but slide code in legacy shape.
        let mixed = CURRENT.replace(r#"["0/0", "0/1"]"#, r#""0/0""#);
        assert!(parse_document(&mixed).is_err());
    }

    #[test]
    fn test_split_slide_code() {
        assert_eq!(split_slide_code("3/1").unwrap(), ("3", "1"));
        assert!(split_slide_code("3").is_err());
        assert!(split_slide_code("/1").is_err());
    }

    #[test]
    fn test_capture_manifest() {
        let json = r#"{"title":"T","author":"","date":"","desc":"",
            "steps":[[{"window":"0/0.png","metadata":"0/0.json"}],
                     [{"window":"1/0.png","metadata":"1/0.json"},{"window":"1/1.png","metadata":"1/1.json"}]]}"#;
        let manifest = CaptureManifest::from_json(json).unwrap();
        assert_eq!(manifest.steps.len(), 2);
        assert_eq!(manifest.steps[1][1].metadata, "1/1.json");
    }
}
