//! Font catalog: the directory of known families, their styles and file locations.
//!
//! The catalog is modeled as a single capability (`CatalogProvider::lookup`) with
//! interchangeable backing stores:
//! - [`snapshot::SnapshotCatalog`]: an in-process font list loaded once at startup.
//! - [`remote::RemoteCatalog`]: a lookup service queried per font id.
//!
//! Catalog data is immutable. A [`FileReference`] only carries the remote URL; whether a
//! file has been fetched is tracked by [`crate::cache::FetchCache`], never here.
//!
//! Matching rule for lookups (first match wins):
//! - exact match on `id`
//! - case-insensitive exact match on `family`

pub mod remote;
pub mod snapshot;
pub mod sync;

use std::collections::BTreeMap;

use async_trait::async_trait;

/// One remote font file for a `(family, variant)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileReference {
    pub url: String,
}

impl FileReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// One font family as known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontDescriptor {
    /// Stable short identifier (e.g. `roboto`, `open-sans`).
    pub id: String,
    /// Human-readable family name (e.g. `Open Sans`).
    pub family: String,
    /// Style names in catalog order (e.g. `regular`, `italic`, `700`).
    pub variants: Vec<String>,
    /// Style name -> file. At most one file per variant.
    pub files: BTreeMap<String, FileReference>,
}

impl FontDescriptor {
    /// Whether `query` selects this descriptor under the catalog matching rule.
    pub fn matches(&self, query: &str) -> bool {
        self.id == query || self.family.to_lowercase() == query.to_lowercase()
    }

    pub fn has_variant(&self, style: &str) -> bool {
        self.variants.iter().any(|v| v == style)
    }
}

/// Errors produced by catalog providers.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// The backing store could not be consulted at all (failed snapshot load, remote
    /// service unreachable or returning garbage).
    #[error("no font list available: {0}")]
    Unavailable(String),
}

/// Supplies font descriptors by id or family name.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Look up a descriptor. `Ok(None)` means the catalog was consulted and has no match.
    async fn lookup(&self, query: &str) -> Result<Option<FontDescriptor>, CatalogError>;
}

/// Derive a catalog id from a Google Fonts file URL.
///
/// `https://fonts.gstatic.com/s/<id>/v30/<file>.ttf` -> `<id>`
pub fn id_from_file_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    segments.find(|s| *s == "s")?;
    segments
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Slug used when no file URL yields an id: lowercase, spaces to `-`.
pub fn slug_from_family(family: &str) -> String {
    family.trim().to_lowercase().replace(' ', "-")
}
