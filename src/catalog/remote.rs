//! Remote per-lookup catalog.
//!
//! Queries a google-webfonts-helper compatible service: `GET {base}/api/fonts/{id}`.
//! Nothing is cached between lookups; repeated lookups hit the network again.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{CatalogError, CatalogProvider, FileReference, FontDescriptor, slug_from_family};

#[derive(Debug, Deserialize)]
struct HelperFont {
    id: String,
    family: String,
    #[serde(default)]
    variants: Vec<HelperVariant>,
}

#[derive(Debug, Deserialize)]
struct HelperVariant {
    id: String,
    #[serde(default)]
    ttf: Option<String>,
}

impl HelperFont {
    fn into_descriptor(self) -> FontDescriptor {
        let variants = self.variants.iter().map(|v| v.id.clone()).collect();
        let files: BTreeMap<_, _> = self
            .variants
            .into_iter()
            .filter_map(|v| v.ttf.map(|url| (v.id, FileReference::new(url))))
            .collect();

        FontDescriptor {
            id: self.id,
            family: self.family,
            variants,
            files,
        }
    }
}

/// Catalog backed by a remote lookup service.
#[derive(Debug, Clone)]
pub struct RemoteCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Unavailable(format!("http client: {e}")))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn font_url(&self, query: &str) -> Result<url::Url, CatalogError> {
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|e| CatalogError::Unavailable(format!("bad catalog url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::Unavailable("catalog url cannot be a base".into()))?
            .extend(["api", "fonts", &slug_from_family(query)]);
        Ok(url)
    }
}

#[async_trait]
impl CatalogProvider for RemoteCatalog {
    async fn lookup(&self, query: &str) -> Result<Option<FontDescriptor>, CatalogError> {
        if query.trim().is_empty() {
            return Ok(None);
        }

        let url = self.font_url(query)?;
        log::debug!("catalog: GET {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(CatalogError::Unavailable(format!(
                    "catalog service answered {status}"
                )));
            }
            _ => {}
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;
        let font: HelperFont = serde_json::from_slice(&body)
            .map_err(|e| CatalogError::Unavailable(format!("bad catalog response: {e}")))?;

        let descriptor = font.into_descriptor();
        // The service resolves fuzzy slugs itself; still enforce our matching rule.
        if descriptor.matches(query) {
            Ok(Some(descriptor))
        } else {
            log::debug!(
                "catalog: remote answer {:?} does not match {query:?}",
                descriptor.id
            );
            Ok(None)
        }
    }
}
