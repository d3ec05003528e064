//! In-process catalog snapshot.
//!
//! The snapshot is a font list loaded once (usually at startup) and shared read-only
//! across requests. Two JSON shapes are accepted:
//! - the prepared font list written by `glyphsvg sync-catalog`:
//!   `[{"id", "family", "variants", "files": [{"variant", "url"}]}, ...]`
//! - the raw Google Fonts developer API response:
//!   `{"items": [{"family", "variants", "files": {"<variant>": "<url>"}}, ...]}`
//!
//! A snapshot whose file cannot be read or parsed does not abort startup. It becomes
//! *unavailable* and every lookup reports [`CatalogError::Unavailable`].

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    CatalogError, CatalogProvider, FileReference, FontDescriptor, id_from_file_url,
    slug_from_family,
};

/// One entry of the prepared font list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontListEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub family: String,
    #[serde(default)]
    pub variants: Vec<String>,
    pub files: FontListFiles,
    /// Fields we do not interpret (category, subsets, version...). Kept so that a synced
    /// list carries the upstream metadata through unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `files` is a list in the prepared shape and a map in the raw API shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontListFiles {
    List(Vec<FontListFile>),
    Map(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontListFile {
    pub variant: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum FontListDocument {
    List(Vec<FontListEntry>),
    Api { items: Vec<FontListEntry> },
}

impl FontListDocument {
    pub(crate) fn into_entries(self) -> Vec<FontListEntry> {
        match self {
            Self::List(entries) => entries,
            Self::Api { items } => items,
        }
    }
}

impl FontListFiles {
    /// Variant/url pairs in document order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        match self {
            Self::List(files) => files
                .iter()
                .map(|f| (f.variant.as_str(), f.url.as_str()))
                .collect(),
            Self::Map(files) => files
                .iter()
                .map(|(variant, url)| (variant.as_str(), url.as_str()))
                .collect(),
        }
    }
}

impl FontListEntry {
    /// The id this entry is known by: explicit, else derived from its first file URL,
    /// else a slug of the family name.
    pub fn resolved_id(&self) -> String {
        if let Some(id) = self.id.as_ref().filter(|id| !id.is_empty()) {
            return id.clone();
        }
        self.files
            .pairs()
            .first()
            .and_then(|(_, url)| id_from_file_url(url))
            .unwrap_or_else(|| slug_from_family(&self.family))
    }

    pub fn into_descriptor(self) -> FontDescriptor {
        let id = self.resolved_id();
        let pairs = self.files.pairs();

        let variants = if self.variants.is_empty() {
            pairs.iter().map(|(v, _)| v.to_string()).collect()
        } else {
            self.variants.clone()
        };

        let mut files = BTreeMap::new();
        for (variant, url) in pairs {
            // First file wins if a list repeats a variant.
            files
                .entry(variant.to_string())
                .or_insert_with(|| FileReference::new(url));
        }

        FontDescriptor {
            id,
            family: self.family,
            variants,
            files,
        }
    }
}

#[derive(Debug)]
enum SnapshotState {
    Loaded(Vec<FontDescriptor>),
    Unavailable(String),
}

/// A catalog backed by a preloaded font list.
#[derive(Debug)]
pub struct SnapshotCatalog {
    state: SnapshotState,
}

impl SnapshotCatalog {
    /// Build a snapshot from descriptors. Later descriptors reusing an earlier id are dropped.
    pub fn new(descriptors: impl IntoIterator<Item = FontDescriptor>) -> Self {
        let mut seen = HashSet::new();
        let mut fonts = Vec::new();
        for descriptor in descriptors {
            if !seen.insert(descriptor.id.clone()) {
                log::warn!(
                    "catalog: duplicate font id {:?} ({}), keeping the first entry",
                    descriptor.id,
                    descriptor.family
                );
                continue;
            }
            fonts.push(descriptor);
        }
        Self {
            state: SnapshotState::Loaded(fonts),
        }
    }

    /// Parse either accepted JSON shape.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let document: FontListDocument = serde_json::from_str(text)?;
        Ok(Self::new(
            document
                .into_entries()
                .into_iter()
                .map(FontListEntry::into_descriptor),
        ))
    }

    /// Load a snapshot from disk. Failures produce an unavailable catalog, never an error.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("catalog: cannot read font list {}: {e}", path.display());
                return Self::unavailable(format!("cannot read {}", path.display()));
            }
        };

        match Self::from_json(&text) {
            Ok(catalog) => {
                log::info!(
                    "catalog: loaded {} font families from {}",
                    catalog.len(),
                    path.display()
                );
                catalog
            }
            Err(e) => {
                log::warn!("catalog: cannot parse font list {}: {e}", path.display());
                Self::unavailable(format!("cannot parse {}", path.display()))
            }
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: SnapshotState::Unavailable(reason.into()),
        }
    }

    /// Number of families; zero when unavailable.
    pub fn len(&self) -> usize {
        match &self.state {
            SnapshotState::Loaded(fonts) => fonts.len(),
            SnapshotState::Unavailable(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, SnapshotState::Loaded(_))
    }

    /// Synchronous lookup. Id matches take precedence over family matches anywhere in the list.
    pub fn find(&self, query: &str) -> Result<Option<&FontDescriptor>, CatalogError> {
        let fonts = match &self.state {
            SnapshotState::Loaded(fonts) => fonts,
            SnapshotState::Unavailable(reason) => {
                return Err(CatalogError::Unavailable(reason.clone()));
            }
        };

        let by_id = fonts.iter().find(|f| f.id == query);
        Ok(by_id.or_else(|| {
            let lowered = query.to_lowercase();
            fonts.iter().find(|f| f.family.to_lowercase() == lowered)
        }))
    }
}

#[async_trait]
impl CatalogProvider for SnapshotCatalog {
    async fn lookup(&self, query: &str) -> Result<Option<FontDescriptor>, CatalogError> {
        Ok(self.find(query)?.cloned())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::tests::roboto;

    const PREPARED: &str = r#"[
        {
            "family": "Roboto",
            "category": "sans-serif",
            "variants": ["regular", "italic"],
            "id": "roboto",
            "files": [
                {"variant": "regular", "url": "https://fonts.gstatic.com/s/roboto/v30/regular.ttf", "downloaded": false},
                {"variant": "italic", "url": "https://fonts.gstatic.com/s/roboto/v30/italic.ttf", "downloaded": false}
            ]
        }
    ]"#;

    const RAW_API: &str = r#"{
        "kind": "webfonts#webfontList",
        "items": [
            {
                "family": "Open Sans",
                "variants": ["regular", "700"],
                "files": {
                    "regular": "http://fonts.gstatic.com/s/opensans/v40/a.ttf",
                    "700": "http://fonts.gstatic.com/s/opensans/v40/b.ttf"
                }
            }
        ]
    }"#;

    #[test]
    fn parses_prepared_font_list() {
        let catalog = SnapshotCatalog::from_json(PREPARED).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find("roboto").unwrap(), Some(&roboto()));
    }

    #[test]
    fn parses_raw_api_response_and_derives_ids() {
        let catalog = SnapshotCatalog::from_json(RAW_API).unwrap();
        let font = catalog.find("opensans").unwrap().unwrap();
        assert_eq!(font.family, "Open Sans");
        assert_eq!(font.variants, vec!["regular", "700"]);
        assert_eq!(
            font.files["700"].url,
            "http://fonts.gstatic.com/s/opensans/v40/b.ttf"
        );
        assert!(catalog.find("open sans").unwrap().is_some());
    }

    #[test]
    fn id_match_wins_over_family_match() {
        let mut by_family = roboto();
        by_family.id = "other".into();
        by_family.family = "mono".into();
        let mut by_id = roboto();
        by_id.id = "mono".into();
        by_id.family = "Mono Sans".into();

        let catalog = SnapshotCatalog::new([by_family, by_id]);
        assert_eq!(catalog.find("mono").unwrap().unwrap().family, "Mono Sans");
    }

    #[test]
    fn duplicate_ids_keep_the_first() {
        let mut second = roboto();
        second.family = "Roboto Again".into();
        let catalog = SnapshotCatalog::new([roboto(), second]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find("roboto").unwrap().unwrap().family, "Roboto");
    }

    #[test]
    fn missing_file_yields_unavailable_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = SnapshotCatalog::load(&dir.path().join("font-list.json"));
        assert!(!catalog.is_available());
        assert!(matches!(
            catalog.find("roboto"),
            Err(CatalogError::Unavailable(_))
        ));
    }

    #[test]
    fn garbage_file_yields_unavailable_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font-list.json");
        std::fs::write(&path, "module.exports = []").unwrap();
        assert!(!SnapshotCatalog::load(&path).is_available());
    }

    #[tokio::test]
    async fn lookup_returns_owned_descriptor() {
        let catalog = SnapshotCatalog::new([roboto()]);
        assert_eq!(catalog.lookup("ROBOTO").await.unwrap(), Some(roboto()));
        assert_eq!(catalog.lookup("nope").await.unwrap(), None);
    }
}
