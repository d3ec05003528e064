//! SVG document assembly and post-processing of the root/path elements.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::RenderError;
use super::layout::TextMetrics;

static SVG_OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").expect("valid regex"));
static WIDTH_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\swidth="([^"]*)""#).expect("valid regex"));
static PATH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<path\b([^>]*?)(/?)>").expect("valid regex"));
static FILL_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\sfill="[^"]*""#).expect("valid regex"));

/// A CSS hex color given without the leading `#` (`f00`, `ff0000`, `ff000080`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexColor(String);

impl HexColor {
    /// Accepts 3, 4, 6 or 8 hex digits, with or without a leading `#`.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        let valid_len = matches!(digits.len(), 3 | 4 | 6 | 8);
        (valid_len && digits.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| Self(digits.to_ascii_lowercase()))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The unoptimized document: root element sized to the layout box, one glyph path.
pub fn document(metrics: &TextMetrics, path_data: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}" height="{}"><path d="{}"/></svg>"#,
        metrics.width, metrics.height, path_data
    )
}

/// Set `fill` on every `<path>` element, replacing any existing fill.
/// Other elements are left alone.
pub fn apply_fill(svg: &str, color: &HexColor) -> String {
    PATH_TAG
        .replace_all(svg, |caps: &Captures<'_>| {
            let attrs = FILL_ATTR.replace_all(&caps[1], "");
            format!(r#"<path fill="{color}"{attrs}{}>"#, &caps[2])
        })
        .into_owned()
}

/// The numeric `width` of the root `<svg>` element.
pub fn root_width(svg: &str) -> Option<f64> {
    let tag = SVG_OPEN_TAG.find(svg)?;
    let caps = WIDTH_ATTR.captures(tag.as_str())?;
    caps[1].trim().parse().ok()
}

/// Add `extra` to the root element's `width`.
///
/// Glyph boxes are known to underestimate the ink extent; callers pass `font_size / 4`.
pub fn widen_width(svg: &str, extra: f64) -> Result<String, RenderError> {
    let tag = SVG_OPEN_TAG.find(svg).ok_or(RenderError::MissingWidth)?;
    let width = root_width(svg).ok_or(RenderError::MissingWidth)?;

    let widened = WIDTH_ATTR.replacen(tag.as_str(), 1, format!(r#" width="{}""#, width + extra));
    Ok(format!(
        "{}{}{}",
        &svg[..tag.start()],
        widened,
        &svg[tag.end()..]
    ))
}
