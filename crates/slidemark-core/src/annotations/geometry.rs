//! Geometry resolution for annotations.
//!
//! [`plan`] turns one annotation plus its target snapshot into a
//! [`RenderPlan`]: the primitives to rasterize, the bounding box used for
//! hit-testing, and the decorations (target highlight, selection outline).
//! Nothing here touches pixels.

use super::text::{TextMeasure, block_width, wrap_text};
use super::{Annotation, AnnotationKind, SerializableColor};
use crate::mapper::{clamp_to_range, map_from_to};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Tunable constants of annotation layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Shaft length of a plain arrow.
    pub arrow_length: f64,
    /// Shaft length of an arrow carrying a text callout.
    pub arrow_text_length: f64,
    /// Length of each arrowhead wing.
    pub arrowhead_length: f64,
    /// Wing spread divisor: wings sit at `pi / ratio` off the shaft. Must be > 1.
    pub wing_ratio: f64,
    /// Margin added around every bounding box.
    pub bounding_box_padding: f64,
    /// Extent of the click marker drawn at the target's bottom-right corner.
    pub click_marker_size: Size,
    /// Inner padding of a text box (x, y).
    pub text_box_padding: Vec2,
    /// Inner padding of an arrow's text callout (x, y).
    pub arrow_text_padding: Vec2,
    /// Extra space between text lines.
    pub line_spacing: f64,
    /// Wrap width for arrow callout text.
    pub arrow_text_wrap_width: f64,
    /// Shown in an empty text box.
    pub text_box_placeholder: String,
    /// Shown in an empty arrow callout.
    pub arrow_text_placeholder: String,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            arrow_length: 90.0,
            arrow_text_length: 200.0,
            arrowhead_length: 40.0,
            wing_ratio: 3.0,
            bounding_box_padding: 5.0,
            click_marker_size: Size::new(20.0, 30.0),
            text_box_padding: Vec2::new(6.0, 6.0),
            arrow_text_padding: Vec2::new(10.0, 6.0),
            line_spacing: 2.0,
            arrow_text_wrap_width: 300.0,
            text_box_placeholder: "Write something here".to_string(),
            arrow_text_placeholder: "Write your text here".to_string(),
        }
    }
}

/// Everything geometry resolution needs besides the annotation itself.
#[derive(Clone, Copy)]
pub struct GeometryContext<'a> {
    pub metrics: &'a dyn TextMeasure,
    pub config: &'a GeometryConfig,
}

impl<'a> GeometryContext<'a> {
    pub fn new(metrics: &'a dyn TextMeasure, config: &'a GeometryConfig) -> Self {
        Self { metrics, config }
    }
}

/// One drawing instruction in image space.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        from: Point,
        to: Point,
        color: SerializableColor,
        width: f64,
    },
    Polygon {
        points: Vec<Point>,
        color: SerializableColor,
        width: f64,
        filled: bool,
    },
    Rect {
        rect: Rect,
        color: SerializableColor,
        width: f64,
        filled: bool,
    },
    /// A single line of text; `origin` is the top-left of its line box.
    Text {
        origin: Point,
        text: String,
        font_size: f64,
        color: SerializableColor,
    },
}

/// Resolved arrow points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowGeometry {
    /// Direction in `[-1, 1]` on each axis.
    pub direction: Vec2,
    pub head: Point,
    pub tail: Point,
    pub wings: [Point; 2],
}

/// Output of geometry resolution for one annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub kind: AnnotationKind,
    pub primitives: Vec<Primitive>,
    /// Normalized, padded extent of what is drawn.
    pub bounding_box: Rect,
    /// Text frame of TextBox / ArrowWithText, normalized, unpadded.
    pub frame: Option<Rect>,
    pub arrow: Option<ArrowGeometry>,
    /// Raw target rect, outlined while the annotation is being placed or selected.
    pub target_highlight: Option<Rect>,
    /// Bounding box outline for the selected annotation.
    pub selection_outline: Option<Rect>,
}

impl RenderPlan {
    fn empty(kind: AnnotationKind, bounding_box: Rect) -> Self {
        Self {
            kind,
            primitives: Vec::new(),
            bounding_box,
            frame: None,
            arrow: None,
            target_highlight: None,
            selection_outline: None,
        }
    }
}

/// Normalize a rect and grow it by `padding` on every side.
pub fn padded(rect: Rect, padding: f64) -> Rect {
    rect.abs().inflate(padding, padding)
}

fn bounds_of(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |rect, p| rect.union_pt(*p))
}

/// Map `optional - center` through the target's extent into `[-1, 1]` per axis.
pub fn arrow_direction(optional: Point, center: Point, size: Size) -> Vec2 {
    let delta = optional - center;
    Vec2::new(
        clamp_to_range(
            map_from_to(delta.x, -size.width, size.width, -1.0, 1.0),
            -1.0,
            1.0,
        ),
        clamp_to_range(
            map_from_to(delta.y, -size.height, size.height, -1.0, 1.0),
            -1.0,
            1.0,
        ),
    )
}

/// Arrow anchored on `target`, pointing at the target edge facing `optional`.
pub fn arrow_geometry(
    target: Rect,
    optional: Point,
    length: f64,
    config: &GeometryConfig,
) -> ArrowGeometry {
    let size = target.size();
    let center = target.center();
    let direction = arrow_direction(optional, center, size);

    let head = center + Vec2::new(direction.x * size.width / 2.0, direction.y * size.height / 2.0);
    let tail = head + direction * length;

    let ratio = if config.wing_ratio > 1.0 {
        config.wing_ratio
    } else {
        GeometryConfig::default().wing_ratio
    };
    let shaft = tail - head;
    let angle = (-shaft.y).atan2(shaft.x);
    let wing = |theta: f64| {
        head + Vec2::new(
            theta.sin() * config.arrowhead_length,
            theta.cos() * config.arrowhead_length,
        )
    };
    let wings = [wing(angle + PI / ratio), wing(angle + PI - PI / ratio)];

    ArrowGeometry {
        direction,
        head,
        tail,
        wings,
    }
}

/// Resolve an annotation's geometry against its target snapshot.
pub fn plan(annotation: &Annotation, ctx: &GeometryContext<'_>) -> RenderPlan {
    let anchor = annotation.anchor_rect();
    let padding = ctx.config.bounding_box_padding;

    let mut plan = match annotation.kind() {
        AnnotationKind::Arrow => arrow_plan(annotation, anchor, ctx, false),
        AnnotationKind::ArrowWithText => arrow_plan(annotation, anchor, ctx, true),
        AnnotationKind::Rectangle => rectangle_plan(annotation, anchor, padding),
        AnnotationKind::Circle => RenderPlan::empty(AnnotationKind::Circle, padded(anchor, padding)),
        AnnotationKind::TextBox => text_box_plan(annotation, anchor, ctx),
        AnnotationKind::ClickMarker => click_plan(annotation, anchor, ctx.config),
        kind @ (AnnotationKind::SelectionInProgress | AnnotationKind::SelectedForEditing) => {
            return RenderPlan::empty(kind, padded(anchor, padding));
        }
    };

    let highlights_target = !matches!(annotation.kind(), AnnotationKind::Rectangle);
    if highlights_target && (!annotation.persisted || annotation.selection_highlight) {
        plan.target_highlight = Some(anchor);
    }
    if annotation.selection_highlight {
        plan.selection_outline = Some(plan.bounding_box);
    }
    plan
}

fn arrow_plan(
    annotation: &Annotation,
    anchor: Rect,
    ctx: &GeometryContext<'_>,
    with_text: bool,
) -> RenderPlan {
    let config = ctx.config;
    let style = annotation.style;
    let width = style.thickness as f64;
    let length = if with_text {
        config.arrow_text_length
    } else {
        config.arrow_length
    };
    let arrow = arrow_geometry(anchor, annotation.optional(), length, config);

    let mut primitives = vec![
        Primitive::Line {
            from: arrow.head,
            to: arrow.tail,
            color: style.color,
            width,
        },
        Primitive::Polygon {
            points: vec![arrow.head, arrow.wings[0], arrow.wings[1]],
            color: style.color,
            width,
            filled: true,
        },
    ];
    let mut extent = bounds_of(&[arrow.head, arrow.tail, arrow.wings[0], arrow.wings[1]]);

    let mut frame = None;
    if with_text {
        let font_size = style.font_size as f64;
        let text = if annotation.text.is_empty() {
            config.arrow_text_placeholder.as_str()
        } else {
            annotation.text.as_str()
        };
        let lines = wrap_text(text, config.arrow_text_wrap_width, font_size, ctx.metrics);
        let line_height = ctx.metrics.line_height(font_size) + config.line_spacing;
        let text_width = block_width(&lines, font_size, ctx.metrics);
        let text_height = lines.len() as f64 * line_height;
        let pad = config.arrow_text_padding;

        let rect = Rect::new(
            arrow.tail.x - text_width / 2.0 - pad.x,
            arrow.tail.y - text_height / 2.0 - pad.y,
            arrow.tail.x + text_width / 2.0 + pad.x,
            arrow.tail.y + text_height / 2.0 + pad.y,
        );
        primitives.push(Primitive::Rect {
            rect,
            color: style.color,
            width,
            filled: true,
        });
        push_text_lines(
            &mut primitives,
            &lines,
            Point::new(rect.x0 + pad.x, rect.y0 + pad.y),
            line_height,
            font_size,
        );
        extent = extent.union(rect);
        frame = Some(rect);
    }

    RenderPlan {
        primitives,
        frame,
        arrow: Some(arrow),
        ..RenderPlan::empty(annotation.kind(), padded(extent, config.bounding_box_padding))
    }
}

fn rectangle_plan(annotation: &Annotation, anchor: Rect, padding: f64) -> RenderPlan {
    RenderPlan {
        primitives: vec![Primitive::Rect {
            rect: anchor,
            color: annotation.style.color,
            width: annotation.style.thickness as f64,
            filled: false,
        }],
        ..RenderPlan::empty(AnnotationKind::Rectangle, padded(anchor, padding))
    }
}

fn text_box_plan(annotation: &Annotation, anchor: Rect, ctx: &GeometryContext<'_>) -> RenderPlan {
    let config = ctx.config;
    let style = annotation.style;
    let font_size = style.font_size as f64;
    let pad = config.text_box_padding;

    let origin = anchor.origin() + annotation.offset();
    let corner = origin + annotation.optional().to_vec2();
    let rect = Rect::from_points(origin, corner);

    let text = if annotation.text.is_empty() {
        config.text_box_placeholder.as_str()
    } else {
        annotation.text.as_str()
    };
    let inner_width = (rect.width() - pad.x).max(0.0);
    let lines = wrap_text(text, inner_width, font_size, ctx.metrics);
    let line_height = ctx.metrics.line_height(font_size) + config.line_spacing;

    let mut primitives = vec![Primitive::Rect {
        rect,
        color: style.color,
        width: style.thickness as f64,
        filled: true,
    }];
    push_text_lines(
        &mut primitives,
        &lines,
        Point::new(rect.x0 + pad.x, rect.y0 + pad.y),
        line_height,
        font_size,
    );

    RenderPlan {
        primitives,
        frame: Some(rect),
        ..RenderPlan::empty(
            AnnotationKind::TextBox,
            padded(rect, config.bounding_box_padding),
        )
    }
}

/// Mouse-pointer outline in a 20x30 box.
const CLICK_MARKER_OUTLINE: [(f64, f64); 7] = [
    (0.0, 0.0),
    (0.0, 24.0),
    (6.0, 18.0),
    (10.0, 28.0),
    (13.0, 27.0),
    (9.0, 17.0),
    (17.0, 17.0),
];

fn click_plan(annotation: &Annotation, anchor: Rect, config: &GeometryConfig) -> RenderPlan {
    let corner = Point::new(anchor.x1, anchor.y1) + annotation.offset();
    let marker = Rect::from_origin_size(corner, config.click_marker_size);
    let sx = config.click_marker_size.width / 20.0;
    let sy = config.click_marker_size.height / 30.0;
    let points = CLICK_MARKER_OUTLINE
        .iter()
        .map(|(x, y)| corner + Vec2::new(x * sx, y * sy))
        .collect();

    RenderPlan {
        primitives: vec![Primitive::Polygon {
            points,
            color: annotation.style.color,
            width: annotation.style.thickness as f64,
            filled: true,
        }],
        ..RenderPlan::empty(
            AnnotationKind::ClickMarker,
            padded(marker, config.bounding_box_padding),
        )
    }
}

fn push_text_lines(
    primitives: &mut Vec<Primitive>,
    lines: &[String],
    start: Point,
    line_height: f64,
    font_size: f64,
) {
    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        primitives.push(Primitive::Text {
            origin: Point::new(start.x, start.y + index as f64 * line_height),
            text: line.clone(),
            font_size,
            color: SerializableColor::black(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::text::ApproximateMetrics;
    use crate::widget::WidgetDescriptor;

    fn ctx_parts() -> (ApproximateMetrics, GeometryConfig) {
        (ApproximateMetrics, GeometryConfig::default())
    }

    fn target(x: f64, y: f64, w: f64, h: f64) -> WidgetDescriptor {
        WidgetDescriptor::new("Main/Panel/Button", Point::new(x, y), Size::new(w, h))
    }

    fn resolve(annotation: &Annotation) -> RenderPlan {
        let (metrics, config) = ctx_parts();
        plan(annotation, &GeometryContext::new(&metrics, &config))
    }

    #[test]
    fn test_arrow_at_target_center_is_degenerate() {
        let mut a = Annotation::new(AnnotationKind::Arrow, target(100.0, 100.0, 50.0, 50.0));
        a.set_optional(Point::new(125.0, 125.0));
        let plan = resolve(&a);
        let arrow = plan.arrow.unwrap();
        assert_eq!(arrow.direction, Vec2::ZERO);
        assert_eq!(arrow.head, Point::new(125.0, 125.0));
        assert_eq!(arrow.tail, Point::new(125.0, 125.0));
        assert!(plan.bounding_box.x0 <= plan.bounding_box.x1);
    }

    #[test]
    fn test_arrow_direction_clamped_far_outside() {
        let mut a = Annotation::new(AnnotationKind::Arrow, target(100.0, 100.0, 50.0, 50.0));
        a.set_optional(Point::new(10_000.0, -10_000.0));
        let arrow = resolve(&a).arrow.unwrap();
        assert_eq!(arrow.direction, Vec2::new(1.0, -1.0));
        // Head sits on the target's top-right corner.
        assert_eq!(arrow.head, Point::new(150.0, 100.0));
        assert_eq!(arrow.tail, Point::new(240.0, 10.0));
    }

    #[test]
    fn test_arrow_partial_direction() {
        // Center (125,125); optional 25px right of center maps to 0.5.
        let mut a = Annotation::new(AnnotationKind::Arrow, target(100.0, 100.0, 50.0, 50.0));
        a.set_optional(Point::new(150.0, 125.0));
        let arrow = resolve(&a).arrow.unwrap();
        assert!((arrow.direction.x - 0.5).abs() < 1e-12);
        assert!(arrow.direction.y.abs() < 1e-12);
        assert!((arrow.head.x - 137.5).abs() < 1e-12);
        assert!((arrow.tail.x - 182.5).abs() < 1e-12);
    }

    #[test]
    fn test_arrow_wings_point_back_along_shaft() {
        let mut a = Annotation::new(AnnotationKind::Arrow, target(0.0, 0.0, 100.0, 100.0));
        a.set_optional(Point::new(1000.0, 50.0));
        let arrow = resolve(&a).arrow.unwrap();
        // Shaft points right, wings trail to the right of the head.
        for wing in arrow.wings {
            assert!(wing.x > arrow.head.x);
        }
        assert!((arrow.wings[0].y - arrow.head.y + (arrow.wings[1].y - arrow.head.y)).abs() < 1e-9);
    }

    #[test]
    fn test_arrow_text_length_and_frame() {
        let mut a = Annotation::new(AnnotationKind::ArrowWithText, target(0.0, 0.0, 100.0, 100.0));
        a.set_optional(Point::new(1000.0, 50.0));
        a.text = "Click here".into();
        let plan = resolve(&a);
        let arrow = plan.arrow.unwrap();
        assert!((arrow.tail.x - (arrow.head.x + 200.0)).abs() < 1e-9);

        let frame = plan.frame.unwrap();
        assert!((frame.center().x - arrow.tail.x).abs() < 1e-9);
        assert!((frame.center().y - arrow.tail.y).abs() < 1e-9);
        assert!(plan.bounding_box.contains(Point::new(frame.x1, frame.y1)));
        assert!(plan.bounding_box.contains(arrow.head));
        assert!(plan.primitives.iter().any(|p| matches!(p, Primitive::Text { text, .. } if text == "Click here")));
    }

    #[test]
    fn test_rectangle_bounds_are_target() {
        let a = Annotation::new(AnnotationKind::Rectangle, target(10.0, 20.0, 30.0, 40.0));
        let plan = resolve(&a);
        assert_eq!(plan.bounding_box, Rect::new(5.0, 15.0, 45.0, 65.0));
        assert!(plan.target_highlight.is_none());
    }

    #[test]
    fn test_text_box_normalizes_corners() {
        let mut a = Annotation::new(AnnotationKind::TextBox, target(10.0, 10.0, 50.0, 50.0));
        a.set_optional(Point::new(-5.0, -5.0));
        let plan = resolve(&a);
        let frame = plan.frame.unwrap();
        assert_eq!(frame.origin(), Point::new(5.0, 5.0));
        assert_eq!(Point::new(frame.x1, frame.y1), Point::new(10.0, 10.0));
        assert_eq!(plan.bounding_box, Rect::new(0.0, 0.0, 15.0, 15.0));
    }

    #[test]
    fn test_text_box_wraps_to_inner_width() {
        let mut a = Annotation::new(AnnotationKind::TextBox, target(0.0, 0.0, 10.0, 10.0));
        a.set_optional(Point::new(80.0, 200.0));
        a.text = "one two three four five six".into();
        let plan = resolve(&a);
        let text_lines = plan
            .primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Text { .. }))
            .count();
        assert!(text_lines > 1);
    }

    #[test]
    fn test_text_box_wrap_width_drops_one_padding() {
        // "ab cd" is 27.5 wide at size 10; the box is 35 wide with 6 padding.
        let mut a = Annotation::new(AnnotationKind::TextBox, target(0.0, 0.0, 10.0, 10.0));
        a.set_optional(Point::new(35.0, 50.0));
        a.style = a.style.with_font_size(10);
        a.text = "ab cd".into();
        let lines: Vec<_> = resolve(&a)
            .primitives
            .into_iter()
            .filter_map(|p| match p {
                Primitive::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(lines, ["ab cd"]);
    }

    #[test]
    fn test_click_marker_at_bottom_right() {
        let a = Annotation::new(AnnotationKind::ClickMarker, target(10.0, 10.0, 20.0, 20.0));
        let plan = resolve(&a);
        assert_eq!(plan.bounding_box, Rect::new(25.0, 25.0, 55.0, 65.0));
    }

    #[test]
    fn test_click_marker_follows_offset() {
        let mut a = Annotation::new(AnnotationKind::ClickMarker, target(10.0, 10.0, 20.0, 20.0));
        a.set_offset(Vec2::new(5.0, -5.0));
        let plan = resolve(&a);
        assert_eq!(plan.bounding_box, Rect::new(30.0, 20.0, 60.0, 60.0));
    }

    #[test]
    fn test_target_highlight_until_persisted() {
        let mut a = Annotation::new(AnnotationKind::Arrow, target(0.0, 0.0, 10.0, 10.0));
        assert_eq!(resolve(&a).target_highlight, Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        a.persisted = true;
        assert!(resolve(&a).target_highlight.is_none());
        a.selection_highlight = true;
        let plan = resolve(&a);
        assert!(plan.target_highlight.is_some());
        assert_eq!(plan.selection_outline, Some(plan.bounding_box));
    }

    #[test]
    fn test_zero_size_target_does_not_panic() {
        for kind in AnnotationKind::ALL {
            let mut a = Annotation::new(kind, target(40.0, 40.0, 0.0, 0.0));
            a.set_optional(Point::new(90.0, 10.0));
            let plan = resolve(&a);
            assert!(plan.bounding_box.x0 <= plan.bounding_box.x1);
            assert!(plan.bounding_box.y0 <= plan.bounding_box.y1);
        }
    }

    #[test]
    fn test_bounds_normalized_for_any_drag() {
        let drags = [
            Point::new(-300.0, -300.0),
            Point::new(300.0, -300.0),
            Point::new(-300.0, 300.0),
            Point::new(300.0, 300.0),
            Point::new(0.0, 0.0),
        ];
        for kind in AnnotationKind::ALL {
            for drag in drags {
                let mut a = Annotation::new(kind, target(100.0, 100.0, 30.0, 20.0));
                a.set_optional(drag);
                a.set_offset(drag.to_vec2() * 0.1);
                let bb = resolve(&a).bounding_box;
                assert!(bb.x0 <= bb.x1 && bb.y0 <= bb.y1, "{kind:?} {drag:?}");
            }
        }
    }

    #[test]
    fn test_window_offset_shifts_anchor() {
        let mut a = Annotation::new(AnnotationKind::Rectangle, target(110.0, 60.0, 10.0, 10.0));
        a.set_window_offset(Vec2::new(100.0, 50.0));
        let plan = resolve(&a);
        assert_eq!(plan.bounding_box, Rect::new(5.0, 5.0, 25.0, 25.0));
    }
}
