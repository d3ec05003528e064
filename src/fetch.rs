//! Network access for font files.
//!
//! The fetch cache talks to the network only through [`FontFetcher`], so tests can swap in
//! a counting fake and deployments can swap transports.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request for {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned an empty body")]
    Empty { url: String },

    #[error("{url} did not return a font: {reason}")]
    NotAFont { url: String, reason: String },

    #[error("writing font file failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("recent download of {url} failed, retrying in {remaining:?}")]
    CoolingDown { url: String, remaining: Duration },
}

/// Downloads one remote file completely into memory.
#[async_trait]
pub trait FontFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// [`FontFetcher`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FontFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // `bytes()` fails on truncated bodies (content-length mismatch, reset connection).
        let body = response.bytes().await.map_err(network)?;
        if body.is_empty() {
            return Err(FetchError::Empty {
                url: url.to_string(),
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    use super::*;

    /// Serve `app` on an ephemeral local port and return its base URL.
    pub(crate) async fn serve_locally(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}")
    }

    fn font_host() -> Router {
        Router::new()
            .route("/roboto.ttf", get(|| async { vec![0u8, 1, 0, 0] }))
            .route("/empty.ttf", get(|| async { Vec::<u8>::new() }))
            .route(
                "/busy.ttf",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "try later") }),
            )
            .route("/moved.ttf", get(|| async { (StatusCode::NO_CONTENT, "") }))
    }

    #[tokio::test]
    async fn ok_body_is_returned() {
        let base = serve_locally(font_host()).await;
        let fetcher = HttpFetcher::with_client(reqwest::Client::new());

        let body = fetcher.fetch(&format!("{base}/roboto.ttf")).await.unwrap();
        assert_eq!(&body[..], &[0, 1, 0, 0]);
    }

    #[tokio::test]
    async fn non_ok_statuses_fail() {
        let base = serve_locally(font_host()).await;
        let fetcher = HttpFetcher::with_client(reqwest::Client::new());

        for (path, expected) in [("/missing.ttf", 404), ("/busy.ttf", 503), ("/moved.ttf", 204)] {
            let err = fetcher.fetch(&format!("{base}{path}")).await.unwrap_err();
            assert!(
                matches!(err, FetchError::Status { status, .. } if status == expected),
                "{path}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn empty_body_fails() {
        let base = serve_locally(font_host()).await;
        let fetcher = HttpFetcher::with_client(reqwest::Client::new());

        let err = fetcher.fetch(&format!("{base}/empty.ttf")).await.unwrap_err();
        assert!(matches!(err, FetchError::Empty { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let fetcher = HttpFetcher::with_client(reqwest::Client::new());

        let err = fetcher.fetch(&format!("http://{addr}/x.ttf")).await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }), "{err:?}");
    }
}
