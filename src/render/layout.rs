//! Single-line text layout.
//!
//! The layout model is intentionally small:
//! - One line, one font size.
//! - Pen advances by `advance_width` (+ pair kerning when enabled).
//! - No shaping (ligatures, RTL, complex scripts).
//!
//! Metrics follow the layout box, not the ink box:
//! - `width  = sum(advance + kerning) * size / units_per_em`
//! - `height = (ascender - descender) * size / units_per_em`
//! - the anchor moves the origin by a fraction of width/height
//! - `baseline = y + ascender`

use std::str::FromStr;

use lyon::path::Path;

use super::RenderOptions;
use crate::font::{FontVMetrics, GlyphPlacement, Glyphs};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum HorizontalAnchor {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum VerticalAnchor {
    Baseline,
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Which point of the text box sits at `(x, y)`. Defaults to the top-left corner.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    pub horizontal: HorizontalAnchor,
    pub vertical: VerticalAnchor,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown anchor {0:?}")]
pub struct ParseAnchorError(String);

impl FromStr for Anchor {
    type Err = ParseAnchorError;

    /// Accepts `left|center|right` and `baseline|top|middle|bottom` in any order,
    /// separated by spaces or `-` (`"top"`, `"left top"`, `"top-left"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut anchor = Anchor::default();
        for token in s.split(|c: char| c.is_whitespace() || c == '-') {
            match token.to_ascii_lowercase().as_str() {
                "" => {}
                "left" => anchor.horizontal = HorizontalAnchor::Left,
                "center" => anchor.horizontal = HorizontalAnchor::Center,
                "right" => anchor.horizontal = HorizontalAnchor::Right,
                "baseline" => anchor.vertical = VerticalAnchor::Baseline,
                "top" => anchor.vertical = VerticalAnchor::Top,
                "middle" => anchor.vertical = VerticalAnchor::Middle,
                "bottom" => anchor.vertical = VerticalAnchor::Bottom,
                _ => return Err(ParseAnchorError(s.to_string())),
            }
        }
        Ok(anchor)
    }
}

/// Layout box of a line of text, in user units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextMetrics {
    /// Left edge after anchoring.
    pub x: f64,
    /// Top edge after anchoring.
    pub y: f64,
    pub baseline: f64,
    pub width: f64,
    pub height: f64,
    pub ascender: f64,
    pub descender: f64,
}

/// A glyph run: glyph ids with the advance (font units) to the next glyph.
struct Run {
    glyphs: Vec<(ttf_parser::GlyphId, f64)>,
}

impl Run {
    fn new(glyphs: &Glyphs<'_>, text: &str, kerning: bool) -> Self {
        let ids: Vec<_> = text.chars().map(|ch| glyphs.glyph_id(ch)).collect();
        let glyphs = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let mut advance = glyphs.advance(id);
                if kerning {
                    if let Some(&next) = ids.get(i + 1) {
                        advance += glyphs.kerning(id, next);
                    }
                }
                (id, advance)
            })
            .collect();
        Self { glyphs }
    }

    fn advance_units(&self) -> f64 {
        self.glyphs.iter().map(|(_, advance)| advance).sum()
    }
}

/// Measure `text` and place its box according to `options`.
pub fn measure(
    glyphs: &Glyphs<'_>,
    v_metrics: FontVMetrics,
    text: &str,
    options: &RenderOptions,
) -> TextMetrics {
    let run = Run::new(glyphs, text, options.kerning);
    metrics_for(&run, v_metrics, options)
}

fn metrics_for(run: &Run, v: FontVMetrics, options: &RenderOptions) -> TextMetrics {
    let size = options.font_size;
    // Multiply before dividing so integral results stay exact.
    let width = run.advance_units() * size / v.units_per_em;
    let ascender = v.ascender * size / v.units_per_em;
    let descender = v.descender * size / v.units_per_em;
    let height = ascender - descender;

    let x = options.x
        - match options.anchor.horizontal {
            HorizontalAnchor::Left => 0.0,
            HorizontalAnchor::Center => width / 2.0,
            HorizontalAnchor::Right => width,
        };
    let y = options.y
        - match options.anchor.vertical {
            VerticalAnchor::Baseline => ascender,
            VerticalAnchor::Top => 0.0,
            VerticalAnchor::Middle => height / 2.0,
            VerticalAnchor::Bottom => height,
        };

    TextMetrics {
        x,
        y,
        baseline: y + ascender,
        width,
        height,
        ascender,
        descender,
    }
}

/// Lay out `text` into placed glyph outlines, together with its metrics.
pub fn layout(
    glyphs: &Glyphs<'_>,
    v_metrics: FontVMetrics,
    text: &str,
    options: &RenderOptions,
) -> (TextMetrics, Vec<Path>) {
    let run = Run::new(glyphs, text, options.kerning);
    let metrics = metrics_for(&run, v_metrics, options);
    let scale = options.font_size / v_metrics.units_per_em;

    let mut pen_units = 0.0;
    let mut outlines = Vec::with_capacity(run.glyphs.len());
    for &(id, advance) in &run.glyphs {
        let placement = GlyphPlacement::new(
            scale as f32,
            (metrics.x + pen_units * scale) as f32,
            metrics.baseline as f32,
        );
        // Glyphs without contours (space) still advance the pen.
        if let Some(outline) = glyphs.outline(id, placement) {
            outlines.push(outline);
        }
        pen_units += advance;
    }

    (metrics, outlines)
}
