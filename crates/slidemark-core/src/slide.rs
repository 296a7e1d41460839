//! One tutorial page: a background image, its widgets and its annotations.

use crate::annotations::{
    Annotation, AnnotationId, GeometryConfig, GeometryContext, RenderPlan, TextMeasure,
};
use crate::error::SchemaError;
use crate::mapper::fit_within;
use crate::widget::WidgetDescriptor;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for slides.
pub type SlideId = Uuid;

/// What kind of page a slide is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SlideLayout {
    #[default]
    Screenshot,
    Cover,
    Acknowledgment,
    Blank,
}

impl SlideLayout {
    pub fn name(self) -> &'static str {
        match self {
            SlideLayout::Screenshot => "Screenshot",
            SlideLayout::Cover => "Cover",
            SlideLayout::Acknowledgment => "Acknowledgment",
            SlideLayout::Blank => "Blank",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, SchemaError> {
        match name {
            "Screenshot" => Ok(SlideLayout::Screenshot),
            "Cover" | "CoverPage" => Ok(SlideLayout::Cover),
            "Acknowledgment" => Ok(SlideLayout::Acknowledgment),
            "Blank" => Ok(SlideLayout::Blank),
            other => Err(SchemaError::UnknownLayout(other.to_string())),
        }
    }

    /// Cover and acknowledgment pages are exported even when inactive.
    pub fn always_emitted(self) -> bool {
        matches!(self, SlideLayout::Cover | SlideLayout::Acknowledgment)
    }
}

/// Rasterizes resolved annotation geometry onto a slide image.
///
/// The slide resolves geometry with the painter's own text metrics so that
/// bounding boxes match the glyphs actually drawn.
pub trait SlidePainter {
    /// Metrics of the font the painter draws with.
    fn metrics(&self) -> &dyn TextMeasure;

    /// Layout constants to resolve geometry with.
    fn geometry(&self) -> &GeometryConfig;

    /// Called once at the start of every redraw.
    fn begin_frame(&mut self) {}

    /// Draw one annotation's plan onto `canvas`.
    fn paint(&mut self, canvas: &mut RgbaImage, plan: &RenderPlan);
}

/// A tutorial page.
#[derive(Debug, Clone)]
pub struct Slide {
    id: SlideId,
    background: Arc<RgbaImage>,
    composed: Option<RgbaImage>,
    /// Widgets visible on the background, fixed at capture time.
    pub widgets: Vec<WidgetDescriptor>,
    annotations: Vec<Annotation>,
    pub title: String,
    pub body: String,
    pub layout: SlideLayout,
    /// `"<step>/<window>"` codes the background was built from.
    pub screenshot_sources: Vec<String>,
    /// Whether the slide is emitted on save/export.
    pub active: bool,
    /// The background is a slide image written by an earlier save, used
    /// because its window captures are gone.
    pub rendered_background: bool,
    window_offset: Vec2,
}

impl Slide {
    /// A screenshot slide.
    pub fn new(background: RgbaImage, widgets: Vec<WidgetDescriptor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            background: Arc::new(background),
            composed: None,
            widgets,
            annotations: Vec::new(),
            title: String::new(),
            body: String::new(),
            layout: SlideLayout::Screenshot,
            screenshot_sources: Vec::new(),
            active: true,
            rendered_background: false,
            window_offset: Vec2::ZERO,
        }
    }

    /// A page without widgets (cover, acknowledgment, blank).
    pub fn page(layout: SlideLayout, background: RgbaImage) -> Self {
        Self {
            layout,
            ..Self::new(background, Vec::new())
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.screenshot_sources = sources;
        self
    }

    pub fn id(&self) -> SlideId {
        self.id
    }

    /// Whether the slide is written on save.
    pub fn is_emitted(&self) -> bool {
        self.active || self.layout.always_emitted()
    }

    /// Deep copy with fresh slide and annotation identities.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        copy.composed = None;
        for annotation in &mut copy.annotations {
            annotation.regenerate_id();
            annotation.selection_highlight = false;
        }
        copy
    }

    pub fn background(&self) -> &RgbaImage {
        &self.background
    }

    pub fn image_size(&self) -> Size {
        Size::new(self.background.width() as f64, self.background.height() as f64)
    }

    pub fn window_offset(&self) -> Vec2 {
        self.window_offset
    }

    /// Change the sub-window translation and restamp every annotation.
    pub fn set_window_offset(&mut self, offset: Vec2) {
        self.window_offset = offset;
        for annotation in &mut self.annotations {
            annotation.set_window_offset(offset);
        }
        self.composed = None;
    }

    /// Annotations in z-order, bottom first.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id() == id)
    }

    pub fn annotation_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id() == id)
    }

    /// Append on top and stamp the slide's window offset onto it.
    pub fn add_annotation(&mut self, mut annotation: Annotation) -> AnnotationId {
        annotation.set_window_offset(self.window_offset);
        let id = annotation.id();
        self.annotations.push(annotation);
        id
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id() == id)?;
        Some(self.annotations.remove(index))
    }

    /// Drop every annotation that was never committed. Returns how many went.
    pub fn discard_uncommitted(&mut self) -> usize {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.persisted);
        before - self.annotations.len()
    }

    /// Clear every selection outline.
    pub fn clear_selection_highlights(&mut self) {
        for annotation in &mut self.annotations {
            annotation.selection_highlight = false;
        }
    }

    /// Widgets containing `position` (shifted by the window offset), in
    /// capture order. The last entry is the front-most candidate.
    pub fn find_widgets_at_position(&self, position: Point) -> Vec<&WidgetDescriptor> {
        let shifted = position + self.window_offset;
        self.widgets
            .iter()
            .filter(|widget| widget.contains(shifted))
            .collect()
    }

    /// Annotations whose bounding box contains `position`, largest area
    /// first. Equal areas keep z-order.
    ///
    /// Annotations not resolved since their last change are measured with
    /// `ctx`.
    pub fn find_annotations_at_position(
        &self,
        position: Point,
        ctx: &GeometryContext<'_>,
    ) -> Vec<&Annotation> {
        let mut hits: Vec<(f64, &Annotation)> = self
            .annotations
            .iter()
            .filter_map(|annotation| {
                let bounds = annotation.resolve_bounding_box(ctx);
                let inside = bounds.x0 <= position.x
                    && position.x <= bounds.x1
                    && bounds.y0 <= position.y
                    && position.y <= bounds.y1;
                inside.then_some((bounds.area(), annotation))
            })
            .collect();
        hits.sort_by(|(a, _), (b, _)| b.total_cmp(a));
        hits.into_iter().map(|(_, annotation)| annotation).collect()
    }

    /// Re-render every annotation, in z-order, onto a fresh copy of the
    /// background.
    pub fn redraw(&mut self, painter: &mut dyn SlidePainter) -> &RgbaImage {
        let mut canvas = RgbaImage::clone(&self.background);
        painter.begin_frame();

        let config = painter.geometry().clone();
        for index in 0..self.annotations.len() {
            let plan = {
                let ctx = GeometryContext::new(painter.metrics(), &config);
                self.annotations[index].compute_geometry(&ctx)
            };
            painter.paint(&mut canvas, &plan);
        }

        self.composed.insert(canvas)
    }

    /// Last redraw result, if any.
    pub fn composed_image(&self) -> Option<&RgbaImage> {
        self.composed.as_ref()
    }

    /// Drop the cached redraw.
    pub fn invalidate(&mut self) {
        self.composed = None;
    }

    /// Scaled copy of the last redraw (or the background if never drawn).
    ///
    /// With `preserve_aspect_ratio` the result fits inside `target`. The
    /// cached image is never touched.
    pub fn resized_output(&self, target: Size, preserve_aspect_ratio: bool) -> RgbaImage {
        let source = self.composed.as_ref().unwrap_or(self.background.as_ref());
        let source_size = Size::new(source.width() as f64, source.height() as f64);
        let size = if preserve_aspect_ratio {
            fit_within(source_size, target)
        } else {
            target
        };
        let width = (size.width.round() as u32).max(1);
        let height = (size.height.round() as u32).max(1);
        if width == source.width() && height == source.height() {
            return source.clone();
        }
        imageops::resize(source, width, height, FilterType::Triangle)
    }
}
