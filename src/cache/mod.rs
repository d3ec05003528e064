//! Fetch cache: each `(font id, variant)` is downloaded at most once per process.
//!
//! Responsibilities:
//! - Own the keyed store `(font id, variant) -> local path`.
//! - Serialize check-download-record per key, so concurrent requests for the same font
//!   never issue a second download. Unrelated keys proceed in parallel.
//! - Write downloads under a deterministic file name (`<id>-<variant>.<ext>`), via a
//!   `.part` file and a rename, so a failed or partial write is never visible as valid.
//! - Only record bodies that parse as a font face. An error page served with status 200
//!   is a failed download, not an entry.
//! - Optionally persist the store to a manifest and reload it at startup.
//!
//! Catalog data never learns about fetch state; the cache is the only shared-mutable piece.

mod manifest;

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::catalog::FileReference;
use crate::fetch::{FetchError, FontFetcher};

/// Key of the fetch cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub font_id: String,
    pub variant: String,
}

impl CacheKey {
    pub fn new(font_id: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            font_id: font_id.into(),
            variant: variant.into(),
        }
    }

    /// Deterministic local file name for this key.
    ///
    /// Both parts are percent-encoded (`-` included), so distinct keys never share a name.
    pub fn file_name(&self, url: &str) -> String {
        format!(
            "{}-{}.{}",
            sanitize(&self.font_id),
            sanitize(&self.variant),
            extension_for(url)
        )
    }
}

/// What to do after a download fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The next request for the key tries again.
    #[default]
    RetryImmediately,
    /// Requests within this window after a failure fail fast without network access.
    Cooldown(Duration),
}

pub struct FetchCache {
    dir: PathBuf,
    manifest_path: Option<PathBuf>,
    fetcher: Arc<dyn FontFetcher>,
    policy: FailurePolicy,

    entries: Mutex<HashMap<CacheKey, PathBuf>>,
    key_locks: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
    failures: Mutex<HashMap<CacheKey, Instant>>,
    /// Orders manifest writes; held only while writing the file.
    persist_lock: tokio::sync::Mutex<()>,
}

impl FetchCache {
    /// An in-memory cache storing files under `dir`.
    pub fn new(dir: impl Into<PathBuf>, fetcher: Arc<dyn FontFetcher>) -> Self {
        Self {
            dir: dir.into(),
            manifest_path: None,
            fetcher,
            policy: FailurePolicy::default(),
            entries: Mutex::new(HashMap::new()),
            key_locks: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Enable persistence. Entries already recorded at `path` are loaded now.
    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let loaded = manifest::load(&path);
        if !loaded.is_empty() {
            log::info!(
                "cache: {} entries loaded from {}",
                loaded.len(),
                path.display()
            );
        }
        self.entries.get_mut().extend(loaded);
        self.manifest_path = Some(path);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The recorded path for a key, if any. Does not check the filesystem.
    pub fn cached_path(&self, font_id: &str, variant: &str) -> Option<PathBuf> {
        self.entries
            .lock()
            .get(&CacheKey::new(font_id, variant))
            .cloned()
    }

    /// Ensure the file for `(font_id, variant)` exists locally and return its path.
    pub async fn materialize(
        &self,
        font_id: &str,
        variant: &str,
        file: &FileReference,
    ) -> Result<PathBuf, FetchError> {
        let key = CacheKey::new(font_id, variant);
        let key_lock = self.key_lock(&key);
        let _guard = key_lock.lock().await;

        let recorded = self.entries.lock().get(&key).cloned();
        if let Some(path) = recorded {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                log::debug!("cache: hit {}/{} -> {}", font_id, variant, path.display());
                return Ok(path);
            }
            log::warn!(
                "cache: {} recorded for {}/{} is gone, fetching again",
                path.display(),
                font_id,
                variant
            );
            self.entries.lock().remove(&key);
        }

        self.check_cooldown(&key, &file.url)?;

        let path = self.dir.join(key.file_name(&file.url));
        log::info!("cache: downloading {}/{} from {}", font_id, variant, file.url);

        if let Err(e) = self.download(&file.url, &path).await {
            log::warn!("cache: download of {}/{} failed: {e}", font_id, variant);
            if let FailurePolicy::Cooldown(_) = self.policy {
                self.failures.lock().insert(key, Instant::now());
            }
            return Err(e);
        }

        self.failures.lock().remove(&key);
        self.entries.lock().insert(key, path.clone());
        self.persist().await;

        log::info!("cache: stored {}/{} at {}", font_id, variant, path.display());
        Ok(path)
    }

    /// Forget the entry for `(font_id, variant)` and delete its file, so the next
    /// `materialize` downloads it again. Used when a recorded file turns out unreadable.
    pub async fn invalidate(&self, font_id: &str, variant: &str) {
        let key = CacheKey::new(font_id, variant);
        let key_lock = self.key_lock(&key);
        let _guard = key_lock.lock().await;

        let Some(path) = self.entries.lock().remove(&key) else {
            return;
        };
        log::warn!(
            "cache: dropping {}/{} ({})",
            font_id,
            variant,
            path.display()
        );
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("cache: cannot remove {}: {e}", path.display());
            }
        }
        self.persist().await;
    }

    fn key_lock(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        self.key_locks
            .lock()
            .entry(key.clone())
            .or_default()
            .clone()
    }

    fn check_cooldown(&self, key: &CacheKey, url: &str) -> Result<(), FetchError> {
        let FailurePolicy::Cooldown(window) = self.policy else {
            return Ok(());
        };
        let Some(failed_at) = self.failures.lock().get(key).copied() else {
            return Ok(());
        };

        let elapsed = failed_at.elapsed();
        if elapsed < window {
            return Err(FetchError::CoolingDown {
                url: url.to_string(),
                remaining: window - elapsed,
            });
        }
        Ok(())
    }

    async fn download(&self, url: &str, path: &Path) -> Result<(), FetchError> {
        let body = self.fetcher.fetch(url).await?;
        if let Err(e) = ttf_parser::Face::parse(&body, 0) {
            return Err(FetchError::NotAFont {
                url: url.to_string(),
                reason: e.to_string(),
            });
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = part_path(path);
        let written = async {
            tokio::fs::write(&tmp, &body).await?;
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn persist(&self) {
        let Some(manifest_path) = &self.manifest_path else {
            return;
        };

        let _guard = self.persist_lock.lock().await;
        // Snapshot under the write lock so the newest state is what lands on disk last.
        let json = match manifest::to_json(&self.entries.lock()) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("cache: cannot serialize manifest: {e}");
                return;
            }
        };
        if let Err(e) = manifest::store(manifest_path, json).await {
            log::warn!(
                "cache: cannot write manifest {}: {e}",
                manifest_path.display()
            );
        }
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Everything except `[A-Za-z0-9_]` is escaped; `-` stays free as the separator.
const FILE_NAME_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_');

fn sanitize(part: &str) -> String {
    utf8_percent_encode(part, FILE_NAME_ESCAPES).to_string()
}

fn extension_for(url: &str) -> &'static str {
    let ext = url::Url::parse(url).ok().and_then(|u| {
        Path::new(u.path())
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    });
    match ext.as_deref() {
        Some("otf") => "otf",
        _ => "ttf",
    }
}
