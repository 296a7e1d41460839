//! Widget-metadata sidecar written next to every capture image.
//!
//! Shape: `{"_devicePixelRatio": 2.0, "0": {..descriptor..}, "1": {..}}`.
//! Keys starting with `_` carry metadata; every other key is a widget index.
//! Entry `0` is the window's own frame.

use super::WidgetDescriptor;
use crate::error::SchemaError;
use serde_json::Value;

/// Metadata key for the capture's device pixel ratio.
pub const DEVICE_PIXEL_RATIO_KEY: &str = "_devicePixelRatio";

/// A parsed sidecar, widget geometry already divided by the pixel ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSidecar {
    pub device_pixel_ratio: f64,
    pub widgets: Vec<WidgetDescriptor>,
}

impl WidgetSidecar {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let Value::Object(map) = value else {
            return Err(SchemaError::Other("sidecar must be a JSON object".into()));
        };

        let device_pixel_ratio = map
            .get(DEVICE_PIXEL_RATIO_KEY)
            .and_then(Value::as_f64)
            .unwrap_or(1.0);

        let mut entries: Vec<(String, Value)> = map
            .into_iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .collect();
        // Object keys come back sorted as strings; restore capture order.
        entries.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => a.cmp(b),
        });

        let widgets = entries
            .into_iter()
            .map(|(_, entry)| {
                serde_json::from_value::<WidgetDescriptor>(entry)
                    .map(|w| w.to_logical(device_pixel_ratio))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            device_pixel_ratio,
            widgets,
        })
    }
}
