//! A small SVG minifier for the documents this crate emits.
//!
//! Transformations (none change what is drawn):
//! - drop XML comments and whitespace between tags
//! - drop the `xmlns:xlink` declaration when nothing uses the prefix
//! - round numeric geometry attributes to `float_precision` decimals
//! - rewrite path data with rounded numbers, no leading zeros and minimal separators

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid regex"));
static XLINK_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\sxmlns:xlink="[^"]*""#).expect("valid regex"));
static NUMERIC_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s(?:width|height|x|y|font-size|stroke-width)=")([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)""#)
        .expect("valid regex")
});
static PATH_DATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\sd=")([^"]*)""#).expect("valid regex"));
static PATH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z]|[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("valid regex")
});

#[derive(Debug, Clone, Copy)]
pub struct OptimizeOptions {
    /// Decimals kept in coordinates and numeric attributes.
    pub float_precision: u32,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self { float_precision: 3 }
    }
}

pub fn optimize(svg: &str, options: &OptimizeOptions) -> String {
    let svg = COMMENT.replace_all(svg, "");
    let svg = BETWEEN_TAGS.replace_all(&svg, "><");
    let svg = svg.trim();

    let without_xlink = XLINK_DECL.replace_all(svg, "");
    let svg: Cow<'_, str> = if without_xlink.contains("xlink:") {
        Cow::Borrowed(svg)
    } else {
        without_xlink
    };

    let precision = options.float_precision;
    let svg = NUMERIC_ATTR.replace_all(&svg, |caps: &Captures<'_>| {
        match caps[2].parse::<f64>() {
            Ok(v) => format!(r#"{}{}""#, &caps[1], round(v, precision)),
            Err(_) => caps[0].to_string(),
        }
    });
    let svg = PATH_DATA.replace_all(&svg, |caps: &Captures<'_>| {
        format!(r#"{}{}""#, &caps[1], path_data(&caps[2], precision))
    });

    svg.into_owned()
}

/// Re-serialize path data. Command letters pass through; numbers are rounded.
pub fn path_data(d: &str, precision: u32) -> String {
    let mut out = String::with_capacity(d.len());
    let mut prev_number: Option<String> = None;

    for token in PATH_TOKEN.find_iter(d).map(|m| m.as_str()) {
        let Ok(v) = token.parse::<f64>() else {
            out.push_str(token);
            prev_number = None;
            continue;
        };

        let number = strip_leading_zero(round(v, precision));
        if let Some(prev) = &prev_number {
            // "1.5.5" reads as 1.5 0.5, "1-2" as 1 -2.
            let joins = number.starts_with('-')
                || (number.starts_with('.') && prev.contains('.') && !prev.contains(['e', 'E']));
            if !joins {
                out.push(' ');
            }
        }
        out.push_str(&number);
        prev_number = Some(number);
    }
    out
}

fn round(v: f64, precision: u32) -> String {
    let factor = 10f64.powi(precision as i32);
    let rounded = (v * factor).round() / factor;
    // Avoid "-0".
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded}")
}

fn strip_leading_zero(number: String) -> String {
    if let Some(rest) = number.strip_prefix("0.") {
        format!(".{rest}")
    } else if let Some(rest) = number.strip_prefix("-0.") {
        format!("-.{rest}")
    } else {
        number
    }
}
