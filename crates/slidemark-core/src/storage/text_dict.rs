//! Externalized, localizable tutorial text.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the default (unlocalized) dictionary.
pub const DEFAULT_TEXT_DICT: &str = "text_dict_default.json";

/// Flat key -> text map. Keys are derived from slide and annotation position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextDictionary(BTreeMap<String, String>);

impl TextDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionary file name for `locale`, or the default one.
    pub fn file_name(locale: Option<&str>) -> String {
        match locale {
            Some(locale) if !locale.is_empty() => format!("text_dict_{locale}.json"),
            _ => DEFAULT_TEXT_DICT.to_string(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.0.insert(key.into(), text.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Text for `key`, empty when absent.
    pub fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(TextDictionary::file_name(None), "text_dict_default.json");
        assert_eq!(TextDictionary::file_name(Some("")), "text_dict_default.json");
        assert_eq!(TextDictionary::file_name(Some("es")), "text_dict_es.json");
    }

    #[test]
    fn test_missing_key_is_empty() {
        let mut dict = TextDictionary::new();
        dict.insert("0_slide_title", "Hello");
        assert_eq!(dict.text("0_slide_title"), "Hello");
        assert_eq!(dict.text("nope"), "");
    }

    #[test]
    fn test_json_is_flat_object() {
        let mut dict = TextDictionary::new();
        dict.insert("b", "2");
        dict.insert("a", "1");
        let json = dict.to_json().unwrap();
        assert!(json.find("\"a\"").unwrap() < json.find("\"b\"").unwrap());
        assert_eq!(TextDictionary::from_json(&json).unwrap(), dict);
        assert!(TextDictionary::from_json("[1]").is_err());
    }
}
