//! Font module root.
//!
//! Text is set from **vector glyph outlines**:
//! - Load a font file that the fetch cache materialized.
//! - Map characters to glyph ids, read advances and kerning.
//! - Extract glyph outlines (move_to/line_to/quad_to/curve_to) from TTF/OTF as
//!   `lyon::path::Path`, already placed in SVG user space.
//!
//! Coordinates:
//! - Font data is in **font units** (units-per-em), Y up.
//! - Placed outlines are in user units (px at the requested font size), Y down.

pub mod outline;

#[cfg(test)]
pub(crate) mod test_font;

use std::{fs, path::Path, sync::Arc};

use ttf_parser::GlyphId;

pub use outline::{GlyphPlacement, svg_path_data};

/// Basic vertical metrics needed for consistent baseline alignment.
///
/// Values are in **font units** (units-per-em), taken from `hhea`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FontVMetrics {
    pub units_per_em: f64,
    pub ascender: f64,
    pub descender: f64,
}

/// Errors produced by the font subsystem.
#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("failed to read font file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font face")]
    ParseFailed,
}

/// A loaded font file: raw bytes plus the face index used for parsing.
///
/// The bytes are validated on load; [`FontFile::glyphs`] re-parses the same data.
#[derive(Debug, Clone)]
pub struct FontFile {
    bytes: Arc<[u8]>,
    index: u32,
    v_metrics: FontVMetrics,
}

impl FontFile {
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let data = fs::read(path).map_err(|source| FontError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Result<Self, FontError> {
        let bytes = data.into();
        let index = 0;

        let parsed = ttf_parser::Face::parse(&bytes, index).map_err(|_| FontError::ParseFailed)?;
        let v_metrics = FontVMetrics {
            units_per_em: parsed.units_per_em() as f64,
            ascender: parsed.ascender() as f64,
            descender: parsed.descender() as f64,
        };

        Ok(Self {
            bytes,
            index,
            v_metrics,
        })
    }

    #[inline]
    pub fn v_metrics(&self) -> FontVMetrics {
        self.v_metrics
    }

    /// Parse the face for glyph access. Parse once per render, not per glyph.
    pub fn glyphs(&self) -> Result<Glyphs<'_>, FontError> {
        let face =
            ttf_parser::Face::parse(&self.bytes, self.index).map_err(|_| FontError::ParseFailed)?;
        Ok(Glyphs { face })
    }
}

/// Glyph-level access to a parsed face.
pub struct Glyphs<'a> {
    face: ttf_parser::Face<'a>,
}

impl Glyphs<'_> {
    /// Glyph for `ch`, or `.notdef` (glyph 0) when the font has none.
    pub fn glyph_id(&self, ch: char) -> GlyphId {
        self.face.glyph_index(ch).unwrap_or(GlyphId(0))
    }

    /// Horizontal advance in font units (0 when the font has no metrics for the glyph).
    pub fn advance(&self, glyph: GlyphId) -> f64 {
        self.face.glyph_hor_advance(glyph).unwrap_or(0) as f64
    }

    /// Pair kerning from the `kern` table, in font units.
    pub fn kerning(&self, left: GlyphId, right: GlyphId) -> f64 {
        let Some(kern) = self.face.tables().kern else {
            return 0.0;
        };
        kern.subtables
            .into_iter()
            .filter(|st| st.horizontal && !st.variable && !st.has_cross_stream)
            .find_map(|st| st.glyphs_kerning(left, right))
            .unwrap_or(0) as f64
    }

    /// The glyph outline placed per `placement`, or `None` for glyphs without contours.
    pub fn outline(&self, glyph: GlyphId, placement: GlyphPlacement) -> Option<lyon::path::Path> {
        let mut builder = outline::LyonOutlineBuilder::new(placement);
        self.face.outline_glyph(glyph, &mut builder)?;
        Some(builder.build())
    }
}
