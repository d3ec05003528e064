//! On-disk record of materialized font files.
//!
//! Format: `{"<font id>": {"<variant>": {"path": "<local path>"}}}`.
//!
//! The manifest is advisory. A missing or unparsable file loads as empty, and entries are
//! re-validated against the filesystem before use.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::CacheKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ManifestEntry {
    path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct Manifest {
    fonts: BTreeMap<String, BTreeMap<String, ManifestEntry>>,
}

/// Read the manifest at `path`, returning no entries when it is absent or corrupt.
pub(crate) fn load(path: &Path) -> HashMap<CacheKey, PathBuf> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
        Err(e) => {
            log::warn!("cache: cannot read manifest {}: {e}", path.display());
            return HashMap::new();
        }
    };

    let manifest: Manifest = match serde_json::from_str(&text) {
        Ok(manifest) => manifest,
        Err(e) => {
            log::warn!(
                "cache: ignoring unparsable manifest {}: {e}",
                path.display()
            );
            return HashMap::new();
        }
    };

    manifest
        .fonts
        .into_iter()
        .flat_map(|(font_id, variants)| {
            variants
                .into_iter()
                .map(move |(variant, entry)| (CacheKey::new(&font_id, variant), entry.path))
        })
        .collect()
}

pub(crate) fn to_json(entries: &HashMap<CacheKey, PathBuf>) -> serde_json::Result<String> {
    let mut manifest = Manifest::default();
    for (key, path) in entries {
        manifest
            .fonts
            .entry(key.font_id.clone())
            .or_default()
            .insert(key.variant.clone(), ManifestEntry { path: path.clone() });
    }
    serde_json::to_string_pretty(&manifest)
}

/// Replace the manifest atomically (write a sibling temp file, then rename).
pub(crate) async fn store(path: &Path, json: String) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = super::part_path(path);
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await
}
