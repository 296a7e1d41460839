//! Stitching correlated window captures into one slide image.

use crate::error::ResourceError;
use crate::widget::WidgetDescriptor;
use image::{Rgba, RgbaImage, imageops};

/// One captured window: its pixels and its widgets.
///
/// `widgets[0]` is the window's own frame, positioned in the coordinate
/// frame shared by every window of the step.
#[derive(Debug, Clone)]
pub struct WindowCapture {
    pub image: RgbaImage,
    pub widgets: Vec<WidgetDescriptor>,
}

impl WindowCapture {
    pub fn new(image: RgbaImage, widgets: Vec<WidgetDescriptor>) -> Self {
        Self { image, widgets }
    }
}

/// Result of [`composite`].
#[derive(Debug, Clone)]
pub struct Composite {
    pub image: RgbaImage,
    /// Concatenation of every window's widgets, coordinates untouched.
    pub widgets: Vec<WidgetDescriptor>,
}

/// Draw window 0 as the base and every later window at its frame position.
///
/// The canvas grows to hold windows that extend past the base. Windows
/// placed at negative coordinates are clipped.
pub fn composite(windows: &[WindowCapture]) -> Result<Composite, ResourceError> {
    let (base, rest) = windows.split_first().ok_or(ResourceError::NoWindows)?;

    let mut placements = Vec::with_capacity(rest.len());
    let (mut width, mut height) = (base.image.width(), base.image.height());
    for (index, window) in rest.iter().enumerate() {
        let frame = window
            .widgets
            .first()
            .ok_or(ResourceError::MissingFrame(index + 1))?;
        let x = frame.position.x.round() as i64;
        let y = frame.position.y.round() as i64;
        width = width.max((x + window.image.width() as i64).clamp(0, u32::MAX as i64) as u32);
        height = height.max((y + window.image.height() as i64).clamp(0, u32::MAX as i64) as u32);
        placements.push((x, y));
    }

    let mut image = if (width, height) == (base.image.width(), base.image.height()) {
        base.image.clone()
    } else {
        log::debug!(
            "Composite grows from {}x{} to {width}x{height}",
            base.image.width(),
            base.image.height()
        );
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        imageops::overlay(&mut canvas, &base.image, 0, 0);
        canvas
    };

    for (window, (x, y)) in rest.iter().zip(placements) {
        imageops::overlay(&mut image, &window.image, x, y);
    }

    let widgets = windows
        .iter()
        .flat_map(|window| window.widgets.iter().cloned())
        .collect();

    Ok(Composite { image, widgets })
}
