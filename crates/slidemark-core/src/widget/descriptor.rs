//! Capture-time snapshot of one UI control.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// A UI control as reported by the screenshot source.
///
/// Position and size are in image-space pixels of the screenshot the
/// descriptor came with. `path` is slash-separated and unique within one
/// capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDescriptor", into = "RawDescriptor")]
pub struct WidgetDescriptor {
    pub path: String,
    pub name: String,
    pub text: String,
    pub position: Point,
    pub size: Size,
}

impl WidgetDescriptor {
    pub fn new(path: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            path: path.into(),
            name: String::new(),
            text: String::new(),
            position,
            size,
        }
    }

    /// Stand-in for a path that no longer resolves: a 1x1 rect at the origin.
    ///
    /// The path is kept so the annotation saves back under the same reference.
    pub fn degenerate(path: impl Into<String>) -> Self {
        Self::new(path, Point::ZERO, Size::new(1.0, 1.0))
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bounds in image space.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.position + Vec2::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    /// Inclusive containment on all four edges.
    pub fn contains(&self, point: Point) -> bool {
        let rect = self.rect();
        rect.x0 <= point.x && point.x <= rect.x1 && rect.y0 <= point.y && point.y <= rect.y1
    }

    /// Divide position and size by a device pixel ratio.
    pub fn to_logical(&self, device_pixel_ratio: f64) -> Self {
        if device_pixel_ratio <= 1.0 {
            return self.clone();
        }
        Self {
            position: Point::new(
                self.position.x / device_pixel_ratio,
                self.position.y / device_pixel_ratio,
            ),
            size: Size::new(
                self.size.width / device_pixel_ratio,
                self.size.height / device_pixel_ratio,
            ),
            ..self.clone()
        }
    }
}

/// On-disk shape of a descriptor: `{"name","path","text","position":[x,y],"size":[w,h]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    name: String,
    path: String,
    #[serde(default)]
    text: String,
    position: [f64; 2],
    size: [f64; 2],
}

impl From<RawDescriptor> for WidgetDescriptor {
    fn from(raw: RawDescriptor) -> Self {
        Self {
            path: raw.path,
            name: raw.name,
            text: raw.text,
            position: Point::new(raw.position[0], raw.position[1]),
            size: Size::new(raw.size[0], raw.size[1]),
        }
    }
}

impl From<WidgetDescriptor> for RawDescriptor {
    fn from(widget: WidgetDescriptor) -> Self {
        Self {
            name: widget.name,
            path: widget.path,
            text: widget.text,
            position: [widget.position.x, widget.position.y],
            size: [widget.size.width, widget.size.height],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let w = WidgetDescriptor::new("a", Point::new(10.0, 10.0), Size::new(20.0, 20.0));
        assert!(w.contains(Point::new(10.0, 10.0)));
        assert!(w.contains(Point::new(30.0, 30.0)));
        assert!(!w.contains(Point::new(30.1, 30.0)));
    }

    #[test]
    fn test_degenerate() {
        let w = WidgetDescriptor::degenerate("A/B/C");
        assert_eq!(w.path, "A/B/C");
        assert_eq!(w.position, Point::ZERO);
        assert_eq!(w.size, Size::new(1.0, 1.0));
    }

    #[test]
    fn test_to_logical() {
        let w = WidgetDescriptor::new("a", Point::new(200.0, 100.0), Size::new(40.0, 20.0));
        let logical = w.to_logical(2.0);
        assert_eq!(logical.position, Point::new(100.0, 50.0));
        assert_eq!(logical.size, Size::new(20.0, 10.0));
        assert_eq!(w.to_logical(1.0), w);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"name":"btn","path":"Main/Ok","text":"OK","position":[5,6],"size":[7,8]}"#;
        let w: WidgetDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(w.path, "Main/Ok");
        assert_eq!(w.position, Point::new(5.0, 6.0));
        assert_eq!(w.size, Size::new(7.0, 8.0));

        let value = serde_json::to_value(&w).unwrap();
        assert_eq!(value["position"], serde_json::json!([5.0, 6.0]));
    }
}
