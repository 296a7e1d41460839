//! Annotations anchored to captured widgets.

mod geometry;
mod style;
mod text;

pub use geometry::{
    ArrowGeometry, GeometryConfig, GeometryContext, Primitive, RenderPlan, arrow_direction,
    arrow_geometry, padded, plan,
};
pub use style::{PenStyle, SerializableColor};
pub use text::{ApproximateMetrics, TextMeasure, block_width, wrap_text};

use crate::error::{ConfigurationError, SchemaError};
use crate::widget::WidgetDescriptor;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for annotations.
pub type AnnotationId = Uuid;

/// The closed set of annotation kinds.
///
/// `SelectionInProgress` and `SelectedForEditing` are editor bookkeeping
/// states and never reach a saved document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Arrow,
    ArrowWithText,
    Rectangle,
    /// Reserved: resolves to its target rect and draws nothing.
    Circle,
    TextBox,
    ClickMarker,
    SelectionInProgress,
    SelectedForEditing,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 8] = [
        AnnotationKind::Arrow,
        AnnotationKind::ArrowWithText,
        AnnotationKind::Rectangle,
        AnnotationKind::Circle,
        AnnotationKind::TextBox,
        AnnotationKind::ClickMarker,
        AnnotationKind::SelectionInProgress,
        AnnotationKind::SelectedForEditing,
    ];

    /// Name used in documents and text-dictionary keys.
    pub fn name(self) -> &'static str {
        match self {
            AnnotationKind::Arrow => "Arrow",
            AnnotationKind::ArrowWithText => "ArrowText",
            AnnotationKind::Rectangle => "Rectangle",
            AnnotationKind::Circle => "Circle",
            AnnotationKind::TextBox => "TextBox",
            AnnotationKind::ClickMarker => "Click",
            AnnotationKind::SelectionInProgress => "Selecting",
            AnnotationKind::SelectedForEditing => "Selected",
        }
    }

    /// Parse a document kind name. Transient names are rejected.
    pub fn from_name(name: &str) -> Result<Self, SchemaError> {
        let kind = Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| SchemaError::UnknownKind(name.to_string()))?;
        if kind.is_transient() {
            return Err(SchemaError::TransientKind(kind.name()));
        }
        Ok(kind)
    }

    pub fn is_transient(self) -> bool {
        matches!(
            self,
            AnnotationKind::SelectionInProgress | AnnotationKind::SelectedForEditing
        )
    }

    /// Whether the editor shows the direction/corner handle.
    pub fn wants_optional_handle(self) -> bool {
        matches!(
            self,
            AnnotationKind::Arrow | AnnotationKind::ArrowWithText | AnnotationKind::TextBox
        )
    }

    /// Whether the editor shows the position handle.
    pub fn wants_offset_handle(self) -> bool {
        matches!(self, AnnotationKind::ClickMarker | AnnotationKind::TextBox)
    }

    /// Whether the annotation carries author text.
    pub fn has_text(self) -> bool {
        matches!(self, AnnotationKind::ArrowWithText | AnnotationKind::TextBox)
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One annotation: a kind, the widget it points at, and its free parameters.
#[derive(Debug, Clone)]
pub struct Annotation {
    id: AnnotationId,
    kind: AnnotationKind,
    target: WidgetDescriptor,
    offset: Vec2,
    optional: Point,
    window_offset: Vec2,
    /// Free text; only drawn for kinds with [`AnnotationKind::has_text`].
    pub text: String,
    pub style: PenStyle,
    /// Placement confirmed by the author.
    pub persisted: bool,
    /// Drives the selection outline; never saved.
    pub selection_highlight: bool,
    bounding_box: Option<Rect>,
}

impl Annotation {
    /// Create an unpersisted annotation with default style.
    pub fn new(kind: AnnotationKind, target: WidgetDescriptor) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            target,
            offset: Vec2::ZERO,
            optional: Point::ZERO,
            window_offset: Vec2::ZERO,
            text: String::new(),
            style: PenStyle::default(),
            persisted: false,
            selection_highlight: false,
            bounding_box: None,
        }
    }

    pub fn builder() -> AnnotationBuilder {
        AnnotationBuilder::default()
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Give a copied annotation its own identity.
    pub fn regenerate_id(&mut self) {
        self.id = Uuid::new_v4();
    }

    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    pub fn target(&self) -> &WidgetDescriptor {
        &self.target
    }

    /// Point the annotation at another widget.
    pub fn set_target(&mut self, target: WidgetDescriptor) {
        self.target = target;
        self.bounding_box = None;
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
        self.bounding_box = None;
    }

    pub fn optional(&self) -> Point {
        self.optional
    }

    pub fn set_optional(&mut self, optional: Point) {
        self.optional = optional;
        self.bounding_box = None;
    }

    pub fn window_offset(&self) -> Vec2 {
        self.window_offset
    }

    pub(crate) fn set_window_offset(&mut self, window_offset: Vec2) {
        self.window_offset = window_offset;
        self.bounding_box = None;
    }

    /// Target rect in the slide's drawing frame.
    pub fn anchor_rect(&self) -> Rect {
        self.target.rect() - self.window_offset
    }

    /// Bounding box from the last geometry resolution, if still valid.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.bounding_box
    }

    /// Resolve geometry and remember the resulting bounding box.
    pub fn compute_geometry(&mut self, ctx: &GeometryContext<'_>) -> RenderPlan {
        let plan = plan(self, ctx);
        self.bounding_box = Some(plan.bounding_box);
        plan
    }

    /// Bounding box without caching, used for hit-testing stale annotations.
    pub fn resolve_bounding_box(&self, ctx: &GeometryContext<'_>) -> Rect {
        self.bounding_box
            .unwrap_or_else(|| plan(self, ctx).bounding_box)
    }
}

/// Checked construction of an [`Annotation`].
#[derive(Debug, Default, Clone)]
pub struct AnnotationBuilder {
    kind: Option<AnnotationKind>,
    target: Option<WidgetDescriptor>,
    offset: Vec2,
    optional: Point,
    text: String,
    style: PenStyle,
    persisted: bool,
}

impl AnnotationBuilder {
    pub fn kind(mut self, kind: AnnotationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn target(mut self, target: WidgetDescriptor) -> Self {
        self.target = Some(target);
        self
    }

    pub fn offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn optional(mut self, optional: Point) -> Self {
        self.optional = optional;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn style(mut self, style: PenStyle) -> Self {
        self.style = style;
        self
    }

    pub fn persisted(mut self, persisted: bool) -> Self {
        self.persisted = persisted;
        self
    }

    pub fn build(self) -> Result<Annotation, ConfigurationError> {
        let kind = self.kind.ok_or(ConfigurationError::MissingKind)?;
        let target = self.target.ok_or(ConfigurationError::MissingTarget)?;
        let mut annotation = Annotation::new(kind, target);
        annotation.offset = self.offset;
        annotation.optional = self.optional;
        annotation.text = self.text;
        annotation.style = self.style;
        annotation.persisted = self.persisted;
        Ok(annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;

    fn button() -> WidgetDescriptor {
        WidgetDescriptor::new("Main/Ok", Point::new(10.0, 10.0), Size::new(20.0, 10.0))
    }

    #[test]
    fn test_builder_requires_kind_and_target() {
        assert_eq!(
            Annotation::builder().target(button()).build().unwrap_err(),
            ConfigurationError::MissingKind
        );
        assert_eq!(
            Annotation::builder()
                .kind(AnnotationKind::Arrow)
                .build()
                .unwrap_err(),
            ConfigurationError::MissingTarget
        );
    }

    #[test]
    fn test_builder_carries_fields() {
        let a = Annotation::builder()
            .kind(AnnotationKind::TextBox)
            .target(button())
            .offset(Vec2::new(1.0, 2.0))
            .optional(Point::new(30.0, 40.0))
            .text("hi")
            .persisted(true)
            .build()
            .unwrap();
        assert_eq!(a.offset(), Vec2::new(1.0, 2.0));
        assert_eq!(a.optional(), Point::new(30.0, 40.0));
        assert_eq!(a.text, "hi");
        assert!(a.persisted);
        assert!(!a.selection_highlight);
    }

    #[test]
    fn test_kind_names() {
        for kind in AnnotationKind::ALL {
            if kind.is_transient() {
                assert!(matches!(
                    AnnotationKind::from_name(kind.name()),
                    Err(SchemaError::TransientKind(_))
                ));
            } else {
                assert_eq!(AnnotationKind::from_name(kind.name()).unwrap(), kind);
            }
        }
        assert!(matches!(
            AnnotationKind::from_name("Star"),
            Err(SchemaError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_handles_per_kind() {
        assert!(AnnotationKind::Arrow.wants_optional_handle());
        assert!(!AnnotationKind::Arrow.wants_offset_handle());
        assert!(AnnotationKind::TextBox.wants_optional_handle());
        assert!(AnnotationKind::TextBox.wants_offset_handle());
        assert!(AnnotationKind::ClickMarker.wants_offset_handle());
        assert!(!AnnotationKind::Rectangle.wants_optional_handle());
    }

    #[test]
    fn test_setters_invalidate_bounds() {
        let metrics = ApproximateMetrics;
        let config = GeometryConfig::default();
        let ctx = GeometryContext::new(&metrics, &config);

        let mut a = Annotation::new(AnnotationKind::TextBox, button());
        a.compute_geometry(&ctx);
        assert!(a.bounding_box().is_some());
        a.set_optional(Point::new(50.0, 50.0));
        assert!(a.bounding_box().is_none());
        a.compute_geometry(&ctx);
        a.set_offset(Vec2::new(1.0, 1.0));
        assert!(a.bounding_box().is_none());
    }

    #[test]
    fn test_regenerate_id() {
        let a = Annotation::new(AnnotationKind::Arrow, button());
        let mut b = a.clone();
        assert_eq!(a.id(), b.id());
        b.regenerate_id();
        assert_ne!(a.id(), b.id());
    }
}
