//! Renderer errors and overlay styling.

use slidemark_core::annotations::SerializableColor;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface: {0}")]
    InvalidSurface(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Styling of the editing overlays drawn on top of an annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    /// Outline of the target widget while placing or selecting.
    pub highlight_color: SerializableColor,
    pub highlight_width: f32,
    /// Dashed outline around the selected annotation.
    pub selection_color: SerializableColor,
    pub selection_width: f32,
    /// Dash and gap lengths of the selection outline.
    pub selection_dash: [f32; 2],
    /// Dash offset advanced every frame, so the outline crawls.
    pub dash_step: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            highlight_color: SerializableColor::white(),
            highlight_width: 2.0,
            selection_color: SerializableColor::rgb(0x00, 0xff, 0x00),
            selection_width: 4.0,
            selection_dash: [8.0, 4.0],
            dash_step: 0.1,
        }
    }
}
