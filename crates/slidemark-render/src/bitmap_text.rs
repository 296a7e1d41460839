//! 8x8 bitmap glyphs, scaled by whole pixels.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};
use kurbo::Point;
use slidemark_core::annotations::TextMeasure;

/// Glyph cell size before scaling.
pub const GLYPH_SIZE: u32 = 8;

/// Whole-pixel scale that brings a glyph closest to `font_size`.
pub fn glyph_scale(font_size: f64) -> u32 {
    (font_size / GLYPH_SIZE as f64).round().max(1.0) as u32
}

/// Metrics of the glyphs [`draw_text`] produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapMetrics;

impl TextMeasure for BitmapMetrics {
    fn width(&self, text: &str, font_size: f64) -> f64 {
        (text.chars().count() as u32 * GLYPH_SIZE * glyph_scale(font_size)) as f64
    }

    fn line_height(&self, font_size: f64) -> f64 {
        (GLYPH_SIZE * glyph_scale(font_size)) as f64
    }
}

fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let mix = |d: u8, s: u8| {
        (f64::from(d) * inv + f64::from(s) * a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    let out_a = (f64::from(dst[3]) + f64::from(src[3]) * inv)
        .round()
        .clamp(0.0, 255.0) as u8;
    Rgba([mix(dst[0], src[0]), mix(dst[1], src[1]), mix(dst[2], src[2]), out_a])
}

/// Draw one line of text with its cell's top-left at `origin`.
///
/// Characters without a glyph are drawn as `?`. Pixels outside the canvas
/// are clipped.
pub fn draw_text(canvas: &mut RgbaImage, origin: Point, text: &str, font_size: f64, color: [u8; 4]) {
    let scale = glyph_scale(font_size) as i64;
    let color = Rgba(color);
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);
    let x0 = origin.x.round() as i64;
    let y = origin.y.round() as i64;

    for (index, ch) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            continue;
        };
        let cursor_x = x0 + index as i64 * GLYPH_SIZE as i64 * scale;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE as i64 {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col * scale;
                let py = y + row as i64 * scale;
                for sy in 0..scale {
                    for sx in 0..scale {
                        let (tx, ty) = (px + sx, py + sy);
                        if tx < 0 || ty < 0 || tx >= width || ty >= height {
                            continue;
                        }
                        let dst = *canvas.get_pixel(tx as u32, ty as u32);
                        canvas.put_pixel(tx as u32, ty as u32, blend_pixel(dst, color));
                    }
                }
            }
        }
    }
}
