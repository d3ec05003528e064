//! Rendering module root.
//!
//! Turns a line of text plus a font file into a standalone SVG document:
//! - `layout`: glyph placement and the layout box (width/height/baseline).
//! - `svg`: document assembly, fill recoloring, root-width adjustment.
//! - `optimize`: minification of the assembled document.
//!
//! Pipeline (see [`render_with_font`]):
//! 1. lay out glyph outlines at `font_size`, anchored at `(x, y)`
//! 2. serialize them into a single `<path>` inside an `<svg>` sized to the layout box
//! 3. minify
//! 4. recolor every path when a color was requested
//! 5. widen the root `width` by `font_size / 4`
//!
//! Notes:
//! - Everything here is synchronous and CPU-bound; async callers should run it on a
//!   blocking thread.

pub mod layout;
pub mod optimize;
pub mod svg;

use std::path::Path;

use crate::font::{FontError, FontFile, svg_path_data};

pub use layout::{Anchor, TextMetrics};
pub use svg::HexColor;

/// Default font size in user units (px).
pub const DEFAULT_FONT_SIZE: f64 = 72.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    pub anchor: Anchor,
    /// Fill for every path; `None` leaves the SVG default (black).
    pub color: Option<HexColor>,
    /// Apply pair kerning from the font's `kern` table.
    pub kerning: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            x: 0.0,
            y: 0.0,
            anchor: Anchor::default(),
            color: None,
            kerning: true,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Font(#[from] FontError),

    #[error("font size must be positive and finite, got {0}")]
    InvalidFontSize(f64),

    #[error("rendered document has no numeric root width")]
    MissingWidth,
}

/// Load the font at `path` and render `text` with it.
pub fn render(text: &str, path: &Path, options: &RenderOptions) -> Result<String, RenderError> {
    let font = FontFile::load(path)?;
    render_with_font(text, &font, options)
}

pub fn render_with_font(
    text: &str,
    font: &FontFile,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    if !(options.font_size.is_finite() && options.font_size > 0.0) {
        return Err(RenderError::InvalidFontSize(options.font_size));
    }

    let glyphs = font.glyphs()?;
    let (metrics, outlines) = layout::layout(&glyphs, font.v_metrics(), text, options);
    log::trace!(
        "laid out {} chars into {} outlines, box {}x{}",
        text.chars().count(),
        outlines.len(),
        metrics.width,
        metrics.height
    );

    let document = svg::document(&metrics, &svg_path_data(&outlines));
    let mut document = optimize::optimize(&document, &optimize::OptimizeOptions::default());
    if let Some(color) = &options.color {
        document = svg::apply_fill(&document, color);
    }
    svg::widen_width(&document, options.font_size / 4.0)
}
