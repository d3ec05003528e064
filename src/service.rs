//! Request orchestration, independent of HTTP.
//!
//! One request runs resolve -> materialize -> render and stops at the first failure.
//! A cached file that cannot be loaded as a font is dropped from the cache, so the next
//! request downloads it again instead of failing forever.
//! The HTTP layer only parses parameters and maps [`ServiceError`] to a response.

use std::sync::Arc;

use crate::cache::FetchCache;
use crate::catalog::{CatalogError, CatalogProvider};
use crate::fetch::FetchError;
use crate::font::FontError;
use crate::render::{self, RenderError, RenderOptions};
use crate::resolve::{self, ResolveError};

pub const DEFAULT_TEXT: &str = "Hello world";
pub const DEFAULT_FONT: &str = "roboto";
pub const DEFAULT_STYLE: &str = "regular";

/// A fully-defaulted render request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub text: String,
    /// Catalog id or family name.
    pub font: String,
    /// Exact variant name.
    pub style: String,
    pub options: RenderOptions,
}

impl Default for TextRequest {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            font: DEFAULT_FONT.to_string(),
            style: DEFAULT_STYLE.to_string(),
            options: RenderOptions::default(),
        }
    }
}

/// Everything a request can fail with. `Display` is the user-facing message.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("Invalid {param}: {value}")]
    InvalidParameter { param: &'static str, value: String },

    #[error("{0}")]
    Resolve(ResolveError),

    #[error("No font list available")]
    CatalogUnavailable(#[source] CatalogError),

    #[error("Failed to download font {font_id} ({variant})")]
    Download {
        font_id: String,
        variant: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to render text")]
    Render(#[source] RenderError),

    #[error("Failed to render text")]
    RenderAborted(String),
}

impl From<ResolveError> for ServiceError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Catalog(e) => ServiceError::CatalogUnavailable(e),
            other => ServiceError::Resolve(other),
        }
    }
}

/// The text-to-SVG pipeline over an injected catalog and cache.
#[derive(Clone)]
pub struct TextToSvgService {
    catalog: Arc<dyn CatalogProvider>,
    cache: Arc<FetchCache>,
}

impl TextToSvgService {
    pub fn new(catalog: Arc<dyn CatalogProvider>, cache: Arc<FetchCache>) -> Self {
        Self { catalog, cache }
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Render `request` to an SVG document.
    pub async fn render(&self, request: TextRequest) -> Result<String, ServiceError> {
        let resolved =
            resolve::resolve(self.catalog.as_ref(), &request.font, &request.style).await?;

        let path = self
            .cache
            .materialize(&resolved.font_id, &resolved.variant, &resolved.file)
            .await
            .map_err(|source| ServiceError::Download {
                font_id: resolved.font_id.clone(),
                variant: resolved.variant.clone(),
                source,
            })?;

        let TextRequest { text, options, .. } = request;
        let rendered = tokio::task::spawn_blocking(move || render::render(&text, &path, &options))
            .await
            .map_err(|e| ServiceError::RenderAborted(e.to_string()))?;

        if let Err(RenderError::Font(e @ (FontError::ReadFailed { .. } | FontError::ParseFailed))) =
            &rendered
        {
            log::warn!(
                "cached file for {}/{} is unusable ({e}), dropping it",
                resolved.font_id,
                resolved.variant
            );
            self.cache
                .invalidate(&resolved.font_id, &resolved.variant)
                .await;
        }
        rendered.map_err(ServiceError::Render)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::snapshot::SnapshotCatalog;
    use crate::catalog::tests::roboto;
    use crate::fetch::FontFetcher;
    use crate::font::test_font;
    use crate::render::svg;

    /// Serves a fixed body for every URL and counts requests. An empty body answers 404.
    pub(crate) struct StubFetcher {
        calls: AtomicUsize,
        body: parking_lot::Mutex<Bytes>,
    }

    impl StubFetcher {
        pub(crate) fn serving(body: impl Into<Bytes>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                body: parking_lot::Mutex::new(body.into()),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn set_body(&self, body: impl Into<Bytes>) {
            *self.body.lock() = body.into();
        }
    }

    #[async_trait]
    impl FontFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = self.body.lock().clone();
            if body.is_empty() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
            Ok(body)
        }
    }

    /// A service over a one-family catalog (`roboto`) whose files are the test font.
    pub(crate) fn stub_service(dir: &Path) -> (TextToSvgService, Arc<StubFetcher>) {
        with_body(dir, test_font::build())
    }

    fn with_body(dir: &Path, body: Vec<u8>) -> (TextToSvgService, Arc<StubFetcher>) {
        let fetcher = StubFetcher::serving(body);
        let cache = FetchCache::new(dir, fetcher.clone());
        let catalog = SnapshotCatalog::new([roboto()]);
        (
            TextToSvgService::new(Arc::new(catalog), Arc::new(cache)),
            fetcher,
        )
    }

    fn request(font: &str, style: &str, size: f64) -> TextRequest {
        TextRequest {
            text: "Hi".into(),
            font: font.into(),
            style: style.into(),
            options: RenderOptions {
                font_size: size,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn renders_and_caches_the_font() {
        let dir = tempfile::tempdir().unwrap();
        let (service, fetcher) = stub_service(dir.path());

        let svg = service.render(request("Roboto", "regular", 40.0)).await.unwrap();
        assert_eq!(svg::root_width(&svg), Some(46.0));

        service.render(request("roboto", "regular", 72.0)).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert!(service.cache().cached_path("roboto", "regular").is_some());
    }

    #[tokio::test]
    async fn resolution_failures_keep_their_messages() {
        let dir = tempfile::tempdir().unwrap();
        let (service, fetcher) = stub_service(dir.path());

        let err = service.render(request("unknown", "regular", 72.0)).await.unwrap_err();
        assert_eq!(err.to_string(), "Font unknown not found");

        let err = service.render(request("roboto", "bold", 72.0)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Style bold not found for font roboto. Available styles: regular, italic"
        );
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn download_failures_name_the_font() {
        let dir = tempfile::tempdir().unwrap();
        let (service, fetcher) = with_body(dir.path(), Vec::new());

        let err = service.render(request("roboto", "italic", 72.0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Download { .. }));
        assert_eq!(err.to_string(), "Failed to download font roboto (italic)");

        // Nothing was recorded, so the next request goes to the network again.
        let _ = service.render(request("roboto", "italic", 72.0)).await;
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn error_page_download_does_not_stick() {
        let dir = tempfile::tempdir().unwrap();
        let (service, fetcher) = with_body(dir.path(), b"<html>rate limited</html>".to_vec());

        let err = service.render(TextRequest::default()).await.unwrap_err();
        assert!(
            matches!(
                err,
                ServiceError::Download {
                    source: FetchError::NotAFont { .. },
                    ..
                }
            ),
            "{err:?}"
        );
        assert_eq!(err.to_string(), "Failed to download font roboto (regular)");
        assert!(service.cache().cached_path("roboto", "regular").is_none());

        fetcher.set_body(test_font::build());
        for _ in 0..2 {
            service.render(TextRequest::default()).await.unwrap();
        }
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn unreadable_cached_file_is_fetched_again() {
        let dir = tempfile::tempdir().unwrap();
        let (service, fetcher) = stub_service(dir.path());

        service.render(TextRequest::default()).await.unwrap();
        let path = service.cache().cached_path("roboto", "regular").unwrap();
        std::fs::write(&path, b"truncated").unwrap();

        let err = service.render(TextRequest::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Render(RenderError::Font(_))));
        assert_eq!(err.to_string(), "Failed to render text");
        assert!(service.cache().cached_path("roboto", "regular").is_none());

        service.render(TextRequest::default()).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(std::fs::read(&path).unwrap(), test_font::build());
    }

    #[tokio::test]
    async fn unavailable_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FetchCache::new(dir.path(), StubFetcher::serving(test_font::build()));
        let service = TextToSvgService::new(
            Arc::new(SnapshotCatalog::unavailable("font-list.json is missing")),
            Arc::new(cache),
        );

        let err = service.render(TextRequest::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::CatalogUnavailable(_)));
        assert_eq!(err.to_string(), "No font list available");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_share_one_download() {
        let dir = tempfile::tempdir().unwrap();
        let (service, fetcher) = stub_service(dir.path());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.render(request("roboto", "regular", 40.0)).await })
            })
            .collect();
        for task in tasks {
            let svg = tokio::time::timeout(Duration::from_secs(10), task)
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            assert_eq!(svg::root_width(&svg), Some(46.0));
        }
        assert_eq!(fetcher.calls(), 1);
    }
}
