//! tiny-skia painter implementation.

use crate::bitmap_text::{BitmapMetrics, draw_text};
use crate::renderer::{OverlayStyle, RenderResult, RendererError};
use image::RgbaImage;
use kurbo::{Point, Rect};
use slidemark_core::annotations::{
    GeometryConfig, Primitive, RenderPlan, SerializableColor, TextMeasure,
};
use slidemark_core::slide::SlidePainter;
use tiny_skia::{
    FillRule, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, StrokeDash,
    Transform,
};

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back.
fn with_pixmap(canvas: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) -> RenderResult<()> {
    let (w, h) = canvas.dimensions();
    let size = IntSize::from_wh(w, h)
        .ok_or_else(|| RendererError::InvalidSurface(format!("{w}x{h} canvas")))?;
    let mut pixmap = Pixmap::from_vec(canvas.as_raw().clone(), size)
        .ok_or_else(|| RendererError::RenderFailed("pixmap from canvas".into()))?;

    f(&mut pixmap);

    canvas.copy_from_slice(pixmap.data());
    Ok(())
}

fn paint_for(color: SerializableColor) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn stroke_for(width: f64) -> Stroke {
    Stroke {
        width: width.max(1.0) as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

fn skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    let rect = rect.abs();
    tiny_skia::Rect::from_ltrb(rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32)
}

fn polygon_path(points: &[Point]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for point in rest {
        pb.line_to(point.x as f32, point.y as f32);
    }
    pb.close();
    pb.finish()
}

fn draw_shape(pixmap: &mut Pixmap, primitive: &Primitive) {
    match primitive {
        Primitive::Line {
            from,
            to,
            color,
            width,
        } => {
            let mut pb = PathBuilder::new();
            pb.move_to(from.x as f32, from.y as f32);
            pb.line_to(to.x as f32, to.y as f32);
            // Zero-length lines have no path.
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(
                    &path,
                    &paint_for(*color),
                    &stroke_for(*width),
                    Transform::identity(),
                    None,
                );
            }
        }
        Primitive::Polygon {
            points,
            color,
            width,
            filled,
        } => {
            let Some(path) = polygon_path(points) else {
                return;
            };
            let paint = paint_for(*color);
            if *filled {
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
            pixmap.stroke_path(&path, &paint, &stroke_for(*width), Transform::identity(), None);
        }
        Primitive::Rect {
            rect,
            color,
            width,
            filled,
        } => {
            let Some(skia) = skia_rect(*rect) else {
                return;
            };
            let paint = paint_for(*color);
            if *filled {
                pixmap.fill_rect(skia, &paint, Transform::identity(), None);
            }
            let path = PathBuilder::from_rect(skia);
            pixmap.stroke_path(&path, &paint, &stroke_for(*width), Transform::identity(), None);
        }
        Primitive::Text { .. } => {}
    }
}

fn outline(pixmap: &mut Pixmap, rect: Rect, color: SerializableColor, stroke: &Stroke) {
    if let Some(skia) = skia_rect(rect) {
        let path = PathBuilder::from_rect(skia);
        pixmap.stroke_path(&path, &paint_for(color), stroke, Transform::identity(), None);
    }
}

/// Rasterizes render plans with tiny-skia and bitmap glyphs.
pub struct SkiaPainter {
    metrics: BitmapMetrics,
    config: GeometryConfig,
    overlay: OverlayStyle,
    dash_phase: f32,
}

impl Default for SkiaPainter {
    fn default() -> Self {
        Self::new(GeometryConfig::default())
    }
}

impl SkiaPainter {
    pub fn new(config: GeometryConfig) -> Self {
        Self {
            metrics: BitmapMetrics,
            config,
            overlay: OverlayStyle::default(),
            dash_phase: 0.0,
        }
    }

    pub fn with_overlay(mut self, overlay: OverlayStyle) -> Self {
        self.overlay = overlay;
        self
    }

    /// Current dash offset of the selection outline.
    pub fn dash_phase(&self) -> f32 {
        self.dash_phase
    }

    /// Draw one plan: shapes, then text, then editing overlays.
    pub fn rasterize(&self, canvas: &mut RgbaImage, plan: &RenderPlan) -> RenderResult<()> {
        with_pixmap(canvas, |pixmap| {
            for primitive in &plan.primitives {
                draw_shape(pixmap, primitive);
            }
        })?;

        for primitive in &plan.primitives {
            if let Primitive::Text {
                origin,
                text,
                font_size,
                color,
            } = primitive
            {
                draw_text(canvas, *origin, text, *font_size, color.to_rgba_u8());
            }
        }

        if plan.target_highlight.is_none() && plan.selection_outline.is_none() {
            return Ok(());
        }
        let overlay = self.overlay;
        let dash_phase = self.dash_phase;
        with_pixmap(canvas, |pixmap| {
            if let Some(rect) = plan.target_highlight {
                let stroke = Stroke {
                    width: overlay.highlight_width,
                    ..Default::default()
                };
                outline(pixmap, rect, overlay.highlight_color, &stroke);
            }
            if let Some(rect) = plan.selection_outline {
                let stroke = Stroke {
                    width: overlay.selection_width,
                    dash: StrokeDash::new(overlay.selection_dash.to_vec(), dash_phase),
                    ..Default::default()
                };
                outline(pixmap, rect, overlay.selection_color, &stroke);
            }
        })
    }
}

impl SlidePainter for SkiaPainter {
    fn metrics(&self) -> &dyn TextMeasure {
        &self.metrics
    }

    fn geometry(&self) -> &GeometryConfig {
        &self.config
    }

    fn begin_frame(&mut self) {
        let period: f32 = self.overlay.selection_dash.iter().sum();
        self.dash_phase = (self.dash_phase + self.overlay.dash_step) % period.max(1.0);
    }

    fn paint(&mut self, canvas: &mut RgbaImage, plan: &RenderPlan) {
        if let Err(err) = self.rasterize(canvas, plan) {
            log::warn!("Failed to paint {} annotation: {err}", plan.kind);
        }
    }
}
