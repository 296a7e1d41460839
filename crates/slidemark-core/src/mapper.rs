//! Mapping between image space and display space.
//!
//! Image space is the pixel grid of the captured screenshot. Display space is
//! the pixel grid of the on-screen view that presents it, which may be scaled
//! independently on each axis. Both are anchored at their own top-left corner.

use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Serialize};

/// Linearly remap `value` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// A zero-width input range returns `value` unchanged.
pub fn map_from_to(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let span = in_max - in_min;
    if span.abs() < f64::EPSILON {
        return value;
    }
    (value - in_min) / span * (out_max - out_min) + out_min
}

/// Clamp `value` into `[min, max]`. NaN collapses to `min`.
pub fn clamp_to_range(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

fn rescale_axis(value: f64, from: f64, to: f64) -> f64 {
    if from.abs() < f64::EPSILON {
        return value;
    }
    value / from * to
}

/// Convert a display-space point to image space.
///
/// Axes with a zero display extent pass through unchanged (the view has not
/// been laid out yet).
pub fn to_image_space(point: Point, image_size: Size, display_size: Size) -> Point {
    Point::new(
        rescale_axis(point.x, display_size.width, image_size.width),
        rescale_axis(point.y, display_size.height, image_size.height),
    )
}

/// Convert an image-space point to display space. Inverse of [`to_image_space`].
pub fn to_display_space(point: Point, image_size: Size, display_size: Size) -> Point {
    Point::new(
        rescale_axis(point.x, image_size.width, display_size.width),
        rescale_axis(point.y, image_size.height, display_size.height),
    )
}

/// Largest size with the aspect ratio of `source` that fits inside `bounds`.
pub fn fit_within(source: Size, bounds: Size) -> Size {
    if source.width <= 0.0 || source.height <= 0.0 {
        return bounds;
    }
    let scale = (bounds.width / source.width).min(bounds.height / source.height);
    Size::new(
        (source.width * scale).max(1.0).round(),
        (source.height * scale).max(1.0).round(),
    )
}

/// An image/display size pair for one presented slide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewMapping {
    /// Size of the composed slide image.
    pub image_size: Size,
    /// Size of the view presenting it.
    pub display_size: Size,
}

impl ViewMapping {
    pub fn new(image_size: Size, display_size: Size) -> Self {
        Self {
            image_size,
            display_size,
        }
    }

    /// Convert a display point (pointer position) to image coordinates.
    pub fn to_image(&self, display_point: Point) -> Point {
        to_image_space(display_point, self.image_size, self.display_size)
    }

    /// Convert an image point to display coordinates.
    pub fn to_display(&self, image_point: Point) -> Point {
        to_display_space(image_point, self.image_size, self.display_size)
    }

    /// Affine transform from image to display space.
    ///
    /// Degenerate axes use a unit scale, matching the point conversions.
    pub fn transform(&self) -> Affine {
        let sx = if self.image_size.width.abs() < f64::EPSILON {
            1.0
        } else {
            self.display_size.width / self.image_size.width
        };
        let sy = if self.image_size.height.abs() < f64::EPSILON {
            1.0
        } else {
            self.display_size.height / self.image_size.height
        };
        Affine::scale_non_uniform(sx, sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_from_to() {
        assert!((map_from_to(0.0, -50.0, 50.0, -1.0, 1.0)).abs() < f64::EPSILON);
        assert!((map_from_to(25.0, -50.0, 50.0, -1.0, 1.0) - 0.5).abs() < f64::EPSILON);
        assert!((map_from_to(-100.0, -50.0, 50.0, -1.0, 1.0) + 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_map_from_to_empty_range() {
        assert!((map_from_to(7.0, 3.0, 3.0, -1.0, 1.0) - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_to_range() {
        assert_eq!(clamp_to_range(3.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp_to_range(-3.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp_to_range(0.25, -1.0, 1.0), 0.25);
        assert_eq!(clamp_to_range(f64::NAN, -1.0, 1.0), -1.0);
    }

    #[test]
    fn test_to_image_space_scales_each_axis() {
        let image = Size::new(1600.0, 1200.0);
        let display = Size::new(800.0, 300.0);
        let p = to_image_space(Point::new(400.0, 150.0), image, display);
        assert!((p.x - 800.0).abs() < f64::EPSILON);
        assert!((p.y - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_display_size_passes_through() {
        let image = Size::new(1600.0, 1200.0);
        let p = to_image_space(Point::new(40.0, 15.0), image, Size::new(0.0, 300.0));
        assert!((p.x - 40.0).abs() < f64::EPSILON);
        assert!((p.y - 60.0).abs() < f64::EPSILON);

        let q = to_image_space(Point::new(40.0, 15.0), image, Size::ZERO);
        assert_eq!(q, Point::new(40.0, 15.0));
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mapping = ViewMapping::new(Size::new(1920.0, 1080.0), Size::new(640.0, 480.0));
        let original = Point::new(123.0, 456.0);
        let back = mapping.to_display(mapping.to_image(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_transform_matches_point_mapping() {
        let mapping = ViewMapping::new(Size::new(1000.0, 500.0), Size::new(500.0, 500.0));
        let p = Point::new(200.0, 100.0);
        let via_affine = mapping.transform() * p;
        assert_eq!(via_affine, mapping.to_display(p));
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        let fitted = fit_within(Size::new(800.0, 600.0), Size::new(400.0, 400.0));
        assert_eq!(fitted, Size::new(400.0, 300.0));
    }
}
