//! Service configuration.
//!
//! [`ServiceConfig`] is a plain struct with `Default`; the binary fills it from CLI flags
//! and `GLYPHSVG_*` environment variables. [`ServiceConfig::build`] wires catalog, fetcher
//! and cache into a [`TextToSvgService`].

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::cache::{FailurePolicy, FetchCache};
use crate::catalog::CatalogProvider;
use crate::catalog::remote::RemoteCatalog;
use crate::catalog::snapshot::SnapshotCatalog;
use crate::fetch::HttpFetcher;
use crate::service::TextToSvgService;

pub const DEFAULT_REMOTE_CATALOG: &str = "https://gwfh.mranftl.com";

/// Where font descriptors come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// A font-list JSON file loaded once at startup.
    Snapshot(PathBuf),
    /// A google-webfonts-helper compatible API, queried per lookup.
    Remote(String),
}

impl Default for CatalogSource {
    fn default() -> Self {
        CatalogSource::Remote(DEFAULT_REMOTE_CATALOG.to_string())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("catalog source must be `snapshot:<path>` or `remote:<url>`, got {0:?}")]
pub struct ParseCatalogSourceError(String);

impl FromStr for CatalogSource {
    type Err = ParseCatalogSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseCatalogSourceError(s.to_string());
        let (kind, value) = s.split_once(':').ok_or_else(invalid)?;
        if value.is_empty() {
            return Err(invalid());
        }
        match kind {
            "snapshot" => Ok(CatalogSource::Snapshot(PathBuf::from(value))),
            "remote" => Ok(CatalogSource::Remote(value.trim_end_matches('/').to_string())),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Snapshot(path) => write!(f, "snapshot:{}", path.display()),
            CatalogSource::Remote(url) => write!(f, "remote:{url}"),
        }
    }
}

/// `Cache-Control` values for successful responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Shared-cache max age, seconds.
    pub s_maxage: u64,
    /// Seconds a stale response may be served while revalidating.
    pub stale_while_revalidate: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            s_maxage: 3600,
            stale_while_revalidate: 3900,
        }
    }
}

impl CachePolicy {
    pub fn header_value(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.s_maxage, self.stale_while_revalidate
        )
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub catalog: CatalogSource,
    /// Directory downloaded font files are stored in.
    pub cache_dir: PathBuf,
    /// Enables cache persistence across restarts.
    pub manifest: Option<PathBuf>,
    /// Timeout for every outgoing HTTP request.
    pub http_timeout: Duration,
    /// Zero retries failed downloads on the next request.
    pub failure_cooldown: Duration,
    pub cache_policy: CachePolicy,
    /// Send `Access-Control-Allow-Origin: *`.
    pub cors: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            catalog: CatalogSource::default(),
            cache_dir: std::env::temp_dir().join("glyphsvg-fonts"),
            manifest: None,
            http_timeout: Duration::from_secs(30),
            failure_cooldown: Duration::ZERO,
            cache_policy: CachePolicy::default(),
            cors: true,
        }
    }
}

impl ServiceConfig {
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.failure_cooldown.is_zero() {
            FailurePolicy::RetryImmediately
        } else {
            FailurePolicy::Cooldown(self.failure_cooldown)
        }
    }

    /// Build the catalog provider. A snapshot that fails to load yields an unavailable
    /// catalog instead of an error.
    pub fn catalog_provider(&self) -> anyhow::Result<Arc<dyn CatalogProvider>> {
        Ok(match &self.catalog {
            CatalogSource::Snapshot(path) => Arc::new(SnapshotCatalog::load(path)),
            CatalogSource::Remote(url) => Arc::new(
                RemoteCatalog::new(url.clone(), self.http_timeout)
                    .context("failed to build the catalog HTTP client")?,
            ),
        })
    }

    pub fn build(&self) -> anyhow::Result<TextToSvgService> {
        let catalog = self.catalog_provider()?;

        let fetcher = HttpFetcher::new(self.http_timeout)
            .context("failed to build the font download HTTP client")?;
        std::fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!("failed to create cache dir {}", self.cache_dir.display())
        })?;

        let mut cache = FetchCache::new(&self.cache_dir, Arc::new(fetcher))
            .with_failure_policy(self.failure_policy());
        if let Some(manifest) = &self.manifest {
            cache = cache.with_manifest(manifest);
        }

        log::info!(
            "service: catalog {}, cache dir {}, manifest {}",
            self.catalog,
            self.cache_dir.display(),
            self.manifest
                .as_ref()
                .map_or_else(|| "disabled".to_string(), |p| p.display().to_string())
        );
        Ok(TextToSvgService::new(catalog, Arc::new(cache)))
    }
}
