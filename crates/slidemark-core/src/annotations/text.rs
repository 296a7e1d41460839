//! Text measurement and word wrapping for callout annotations.

/// Font metrics used to lay out annotation text.
///
/// The raster backend supplies metrics that match the glyphs it draws;
/// [`ApproximateMetrics`] is used when no backend is at hand (hit-testing
/// before the first redraw, headless loads).
pub trait TextMeasure {
    /// Advance width of `text` on one line.
    fn width(&self, text: &str, font_size: f64) -> f64;

    /// Distance between consecutive baselines.
    fn line_height(&self, font_size: f64) -> f64;
}

/// Character-count based estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMetrics;

impl ApproximateMetrics {
    /// Average glyph advance as a fraction of the font size.
    const CHAR_WIDTH_FACTOR: f64 = 0.55;
    /// Line height as a multiple of the font size.
    const LINE_HEIGHT_FACTOR: f64 = 1.2;
}

impl TextMeasure for ApproximateMetrics {
    fn width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * Self::CHAR_WIDTH_FACTOR
    }

    fn line_height(&self, font_size: f64) -> f64 {
        font_size * Self::LINE_HEIGHT_FACTOR
    }
}

/// Greedy word wrap.
///
/// Each source line is split on whitespace and words are appended while the
/// line still fits in `max_width`; a word that would overflow starts a new
/// line. A single word wider than `max_width` gets a line of its own. Empty
/// source lines are kept as empty output lines.
pub fn wrap_text(
    text: &str,
    max_width: f64,
    font_size: f64,
    metrics: &dyn TextMeasure,
) -> Vec<String> {
    let mut out = Vec::new();
    for source_line in text.lines() {
        let mut line = String::new();
        for word in source_line.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if metrics.width(&candidate, font_size) > max_width {
                out.push(std::mem::take(&mut line));
                line.push_str(word);
            } else {
                line = candidate;
            }
        }
        out.push(line);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

/// Widest line of `lines`.
pub fn block_width(lines: &[String], font_size: f64, metrics: &dyn TextMeasure) -> f64 {
    lines
        .iter()
        .map(|line| metrics.width(line, font_size))
        .fold(0.0, f64::max)
}
