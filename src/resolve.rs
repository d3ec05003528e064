//! Font resolution: `(font query, style)` -> one concrete font file.
//!
//! Resolution policy lives here and nowhere else:
//! - the catalog decides which family a query names (id, then family name)
//! - the style must be one of the family's variants, compared exactly
//! - the variant must have a file
//!
//! No I/O beyond the catalog call.

use crate::catalog::{CatalogError, CatalogProvider, FileReference};

/// A successfully resolved file, with the key the fetch cache stores it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFont {
    pub font_id: String,
    pub family: String,
    pub variant: String,
    pub file: FileReference,
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("Font {query} not found")]
    FontNotFound { query: String },

    #[error("Style {style} not found for font {font}. Available styles: {}", .available.join(", "))]
    StyleNotFound {
        font: String,
        style: String,
        available: Vec<String>,
    },

    #[error("No file found for style {style} of font {font}")]
    FileNotFound { font: String, style: String },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Resolve `font_query` and `style` against `catalog`.
pub async fn resolve(
    catalog: &dyn CatalogProvider,
    font_query: &str,
    style: &str,
) -> Result<ResolvedFont, ResolveError> {
    let descriptor =
        catalog
            .lookup(font_query)
            .await?
            .ok_or_else(|| ResolveError::FontNotFound {
                query: font_query.to_string(),
            })?;

    if !descriptor.has_variant(style) {
        return Err(ResolveError::StyleNotFound {
            font: descriptor.id,
            style: style.to_string(),
            available: descriptor.variants,
        });
    }

    let file = descriptor
        .files
        .get(style)
        .cloned()
        .ok_or_else(|| ResolveError::FileNotFound {
            font: descriptor.id.clone(),
            style: style.to_string(),
        })?;

    Ok(ResolvedFont {
        font_id: descriptor.id,
        family: descriptor.family,
        variant: style.to_string(),
        file,
    })
}
