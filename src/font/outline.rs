//! Glyph outline extraction and SVG path serialization.
//!
//! `ttf-parser` reports outlines through `OutlineBuilder` callbacks in font units.
//! We place each point (scale to the font size, flip Y, translate to the pen position)
//! while building a `lyon::path::Path`, then serialize the path as SVG path data.
//!
//! Pitfalls:
//! - A glyph may contain multiple contours; `move_to` starts a new one.
//! - Glyphs such as space have no outline at all.

use std::fmt::Write as _;

use lyon::math::{Point, point};
use lyon::path::{Path, PathEvent};

/// Where a glyph lands in user space.
///
/// A font-unit point `(x, y)` maps to `(origin_x + x * scale, baseline - y * scale)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphPlacement {
    pub scale: f32,
    pub origin_x: f32,
    pub baseline: f32,
}

impl GlyphPlacement {
    pub fn new(scale: f32, origin_x: f32, baseline: f32) -> Self {
        Self {
            scale,
            origin_x,
            baseline,
        }
    }

    #[inline]
    fn place(&self, x: f32, y: f32) -> Point {
        point(self.origin_x + x * self.scale, self.baseline - y * self.scale)
    }
}

/// Convert `ttf-parser` outline callbacks into a placed `lyon::path::Path`.
pub(crate) struct LyonOutlineBuilder {
    builder: lyon::path::Builder,
    placement: GlyphPlacement,
    contour_open: bool,
}

impl LyonOutlineBuilder {
    pub(crate) fn new(placement: GlyphPlacement) -> Self {
        Self {
            builder: Path::builder(),
            placement,
            contour_open: false,
        }
    }

    pub(crate) fn build(mut self) -> Path {
        // lyon requires every sub-path to be ended.
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
        self.builder.build()
    }
}

impl ttf_parser::OutlineBuilder for LyonOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        if self.contour_open {
            self.builder.close();
        }
        self.builder.begin(self.placement.place(x, y));
        self.contour_open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.placement.place(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let ctrl = self.placement.place(x1, y1);
        self.builder
            .quadratic_bezier_to(ctrl, self.placement.place(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let ctrl1 = self.placement.place(x1, y1);
        let ctrl2 = self.placement.place(x2, y2);
        self.builder
            .cubic_bezier_to(ctrl1, ctrl2, self.placement.place(x, y));
    }

    fn close(&mut self) {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
    }
}

/// Serialize paths as SVG path data (`M`, `L`, `Q`, `C`, `Z`, absolute coordinates).
///
/// Values are rounded to two decimals; integers print without a fraction. A separator is only
/// emitted before non-negative numbers.
pub fn svg_path_data<'a>(paths: impl IntoIterator<Item = &'a Path>) -> String {
    let mut out = String::new();
    for path in paths {
        for event in path.iter() {
            match event {
                PathEvent::Begin { at } => push_command(&mut out, 'M', &[at]),
                PathEvent::Line { to, .. } => push_command(&mut out, 'L', &[to]),
                PathEvent::Quadratic { ctrl, to, .. } => push_command(&mut out, 'Q', &[ctrl, to]),
                PathEvent::Cubic {
                    ctrl1, ctrl2, to, ..
                } => push_command(&mut out, 'C', &[ctrl1, ctrl2, to]),
                PathEvent::End { close: true, .. } => out.push('Z'),
                PathEvent::End { close: false, .. } => {}
            }
        }
    }
    out
}

fn push_command(out: &mut String, command: char, points: &[Point]) {
    out.push(command);
    let mut first = true;
    for p in points {
        for v in [p.x, p.y] {
            if v >= 0.0 && !first {
                out.push(' ');
            }
            push_number(out, v);
            first = false;
        }
    }
}

fn push_number(out: &mut String, v: f32) {
    let v = (v * 100.0).round() / 100.0;
    if v.fract() == 0.0 {
        let _ = write!(out, "{}", v as i64);
    } else {
        let _ = write!(out, "{:.2}", v);
    }
}
