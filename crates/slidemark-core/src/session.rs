//! Editor session: the state of one annotation editing view.
//!
//! The model (annotations, slides, tutorials) has no notion of a current
//! selection; everything the UI layer tracks between events lives here and
//! every operation is handed the slide it works on.

use crate::annotations::{
    Annotation, AnnotationId, AnnotationKind, ApproximateMetrics, GeometryConfig, GeometryContext,
    PenStyle,
};
use crate::config::AnnotatorConfig;
use crate::mapper::ViewMapping;
use crate::slide::{Slide, SlidePainter};
use image::RgbaImage;
use kurbo::{Point, Size, Vec2};

/// Wheel movement below this is ignored.
const SCROLL_THRESHOLD: f64 = 4.0;

/// Active tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    None,
    /// Pick existing annotations.
    Select,
    /// Place new annotations of one kind.
    Place(AnnotationKind),
}

/// Keyboard input forwarded by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Enter,
    Backspace,
    Paste(String),
    Delete,
    Escape,
    Up,
    Down,
}

/// Display-space positions of the drag handles the UI should show.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HelperHandles {
    /// Direction (arrows) or corner (text box) handle.
    pub optional: Option<Point>,
    /// Position handle (click marker, text box).
    pub offset: Option<Point>,
}

/// Editing state of one slide view.
#[derive(Debug, Clone)]
pub struct EditorSession {
    tool: Tool,
    /// Style for new annotations.
    pen: PenStyle,
    /// The annotation being previewed or edited.
    current: Option<AnnotationId>,
    /// `current` is committed and selected for editing.
    editing: bool,
    /// Steps back from the front-most candidate under the pointer.
    depth: usize,
    display_size: Size,
    helper_offset: Vec2,
    optional_handle: Point,
    offset_handle: Point,
    last_pointer: Option<Point>,
    /// Layout used to measure annotations not yet redrawn.
    geometry: GeometryConfig,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(&AnnotatorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: &AnnotatorConfig) -> Self {
        Self {
            tool: Tool::None,
            pen: config.default_pen,
            current: None,
            editing: false,
            depth: 0,
            display_size: Size::ZERO,
            helper_offset: config.helper_offset,
            optional_handle: Point::ZERO,
            offset_handle: Point::ZERO,
            last_pointer: None,
            geometry: config.geometry.clone(),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools, discarding any uncommitted annotation.
    pub fn set_tool(&mut self, slide: &mut Slide, tool: Tool) {
        self.finish_current(slide);
        self.tool = tool;
        log::debug!("Tool changed to {:?}", tool);
    }

    pub fn pen(&self) -> PenStyle {
        self.pen
    }

    /// Change the pen for new annotations and for the selection.
    pub fn set_pen(&mut self, slide: &mut Slide, pen: PenStyle) {
        self.pen = pen;
        if let Some(annotation) = self.current.and_then(|id| slide.annotation_mut(id)) {
            annotation.style = pen;
        }
    }

    pub fn display_size(&self) -> Size {
        self.display_size
    }

    pub fn set_display_size(&mut self, size: Size) {
        self.display_size = size;
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The selected annotation, once committed.
    pub fn selected(&self) -> Option<AnnotationId> {
        self.current.filter(|_| self.editing)
    }

    /// The uncommitted annotation following the pointer.
    pub fn preview(&self) -> Option<AnnotationId> {
        self.current.filter(|_| !self.editing)
    }

    /// Text of the selection, for copying.
    pub fn selected_text<'a>(&self, slide: &'a Slide) -> Option<&'a str> {
        let annotation = slide.annotation(self.selected()?)?;
        annotation.kind().has_text().then_some(annotation.text.as_str())
    }

    fn mapping(&self, slide: &Slide) -> ViewMapping {
        ViewMapping::new(slide.image_size(), self.display_size)
    }

    /// Handles for the current annotation's kind.
    pub fn handles(&self, slide: &Slide) -> HelperHandles {
        let Some(kind) = self
            .current
            .and_then(|id| slide.annotation(id))
            .map(|a| a.kind())
        else {
            return HelperHandles::default();
        };
        HelperHandles {
            optional: kind.wants_optional_handle().then_some(self.optional_handle),
            offset: kind.wants_offset_handle().then_some(self.offset_handle),
        }
    }

    /// Pointer moved to `position` (display space).
    ///
    /// While placing, the preview follows the widget under the pointer,
    /// `depth` steps back from the front-most one.
    pub fn pointer_moved(&mut self, slide: &mut Slide, position: Point) {
        self.last_pointer = Some(position);
        if self.editing {
            self.apply_handles(slide);
            return;
        }
        let Tool::Place(kind) = self.tool else {
            return;
        };

        let mapping = self.mapping(slide);
        let target = {
            let widgets = slide.find_widgets_at_position(mapping.to_image(position));
            if widgets.is_empty() {
                return;
            }
            self.depth = self.depth.min(widgets.len() - 1);
            widgets[widgets.len() - 1 - self.depth].clone()
        };
        let target_position = target.position;

        match self.current.filter(|id| slide.annotation(*id).is_some()) {
            Some(id) => {
                if let Some(annotation) = slide.annotation_mut(id) {
                    annotation.set_target(target);
                }
            }
            None => {
                let mut annotation = Annotation::new(kind, target);
                annotation.style = self.pen;
                self.current = Some(slide.add_annotation(annotation));
            }
        }

        // Direction handle starts toward the centre of the view.
        let mut helper = self.helper_offset;
        if position.x > self.display_size.width / 2.0 {
            helper.x = -helper.x;
        }
        if position.y > self.display_size.height / 2.0 {
            helper.y = -helper.y;
        }
        self.optional_handle = position + helper;
        self.offset_handle = mapping.to_display(target_position);
        self.apply_handles(slide);
    }

    /// Pointer pressed at `position` (display space).
    ///
    /// Commits the preview while placing, picks an annotation while
    /// selecting. Returns the selection.
    pub fn pointer_pressed(&mut self, slide: &mut Slide, position: Point) -> Option<AnnotationId> {
        if self.editing {
            return self.selected();
        }
        match self.tool {
            Tool::None => None,
            Tool::Select => self.select_at(slide, position),
            Tool::Place(_) => {
                let id = self.current?;
                let annotation = slide.annotation_mut(id)?;
                annotation.persisted = true;
                annotation.selection_highlight = true;
                self.editing = true;
                log::debug!("Committed {} annotation", annotation.kind());
                Some(id)
            }
        }
    }

    fn select_at(&mut self, slide: &mut Slide, position: Point) -> Option<AnnotationId> {
        let mapping = self.mapping(slide);
        let (id, optional, offset) = {
            let ctx = GeometryContext::new(&ApproximateMetrics, &self.geometry);
            let hits = slide.find_annotations_at_position(mapping.to_image(position), &ctx);
            if hits.is_empty() {
                return None;
            }
            self.depth = self.depth.min(hits.len() - 1);
            let hit = hits[hits.len() - 1 - self.depth];
            let target = hit.target();
            let optional = if hit.kind() == AnnotationKind::TextBox {
                target.center() + hit.optional().to_vec2()
            } else {
                hit.optional()
            };
            (hit.id(), optional, target.position + hit.offset())
        };

        self.optional_handle = mapping.to_display(optional);
        self.offset_handle = mapping.to_display(offset);
        if let Some(annotation) = slide.annotation_mut(id) {
            annotation.selection_highlight = true;
        }
        self.current = Some(id);
        self.editing = true;
        Some(id)
    }

    /// Pointer left the view; an uncommitted preview is dropped.
    pub fn pointer_left(&mut self, slide: &mut Slide) {
        if !self.editing && self.current.is_some() {
            self.finish_current(slide);
        }
    }

    /// Move `delta` steps through overlapping candidates; negative moves
    /// toward the front-most.
    pub fn step_depth(&mut self, slide: &mut Slide, delta: i32) {
        self.depth = if delta < 0 {
            self.depth.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            self.depth.saturating_add(delta as usize)
        };
        if let Some(position) = self.last_pointer {
            self.pointer_moved(slide, position);
        }
    }

    /// Wheel input, `delta` in wheel units (positive away from the user).
    pub fn scrolled(&mut self, slide: &mut Slide, delta: f64) {
        if delta > SCROLL_THRESHOLD {
            self.step_depth(slide, -1);
        } else if delta < -SCROLL_THRESHOLD {
            self.step_depth(slide, 1);
        }
    }

    /// Drag the direction/corner handle to `position` (display space).
    pub fn drag_optional_handle(&mut self, slide: &mut Slide, position: Point) {
        self.optional_handle = position;
        self.apply_handles(slide);
    }

    /// Drag the position handle to `position` (display space).
    pub fn drag_offset_handle(&mut self, slide: &mut Slide, position: Point) {
        self.offset_handle = position;
        self.apply_handles(slide);
    }

    /// Write handle positions into the current annotation.
    ///
    /// Arrows keep the handle's image position; a text box keeps its extent
    /// from the target centre. The offset is measured from the target origin.
    fn apply_handles(&mut self, slide: &mut Slide) {
        let mapping = self.mapping(slide);
        let optional = mapping.to_image(self.optional_handle);
        let offset = mapping.to_image(self.offset_handle);
        let Some(annotation) = self.current.and_then(|id| slide.annotation_mut(id)) else {
            return;
        };
        let target = annotation.target().clone();
        if annotation.kind() == AnnotationKind::TextBox {
            annotation.set_optional((optional - target.center()).to_point());
        } else {
            annotation.set_optional(optional);
        }
        annotation.set_offset(offset - target.position);
    }

    /// Handle a key press. Returns whether the session consumed it.
    pub fn key(&mut self, slide: &mut Slide, input: KeyInput) -> bool {
        if input == KeyInput::Escape {
            return false;
        }
        if self.editing {
            if input == KeyInput::Delete {
                self.delete_selected(slide);
                return true;
            }
            let Some(annotation) = self.current.and_then(|id| slide.annotation_mut(id)) else {
                return true;
            };
            if annotation.kind().has_text() {
                match input {
                    KeyInput::Char(c) => annotation.text.push(c),
                    KeyInput::Enter => annotation.text.push('\n'),
                    KeyInput::Backspace => {
                        annotation.text.pop();
                    }
                    KeyInput::Paste(text) => annotation.text.push_str(&text),
                    _ => {}
                }
            }
            return true;
        }
        if self.current.is_some() {
            match input {
                KeyInput::Up => {
                    self.step_depth(slide, -1);
                    return true;
                }
                KeyInput::Down => {
                    self.step_depth(slide, 1);
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    /// Let go of the current annotation.
    ///
    /// An uncommitted one is removed from the slide. After editing, the
    /// session returns to selecting.
    pub fn finish_current(&mut self, slide: &mut Slide) {
        if let Some(id) = self.current.take() {
            let remove = match slide.annotation_mut(id) {
                Some(annotation) => {
                    annotation.selection_highlight = false;
                    !annotation.persisted
                }
                None => false,
            };
            if remove {
                slide.remove_annotation(id);
            }
        }
        if self.editing {
            self.editing = false;
            self.tool = Tool::Select;
        }
    }

    /// Remove the selected annotation from the slide.
    pub fn delete_selected(&mut self, slide: &mut Slide) -> Option<Annotation> {
        let id = self.selected()?;
        let removed = slide.remove_annotation(id);
        self.current = None;
        self.editing = false;
        self.tool = Tool::Select;
        removed
    }

    /// Redraw the slide and scale it to the view.
    pub fn present(&self, slide: &mut Slide, painter: &mut dyn SlidePainter) -> RgbaImage {
        slide.redraw(painter);
        slide.resized_output(self.display_size, true)
    }
}
