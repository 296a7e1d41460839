//! Slidemark Render Library
//!
//! CPU raster backend for slides: resolved annotation plans are stroked and
//! filled with tiny-skia, text is drawn with 8x8 bitmap glyphs.

pub mod bitmap_text;
mod renderer;
mod skia_impl;

pub use bitmap_text::BitmapMetrics;
pub use renderer::{OverlayStyle, RenderResult, RendererError};
pub use skia_impl::SkiaPainter;
