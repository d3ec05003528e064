//! HTTP surface: one GET handler mounted at `/api/text-to-svg` and `/render.svg`.
//!
//! Query parameters (all optional):
//! - `text`  (default `Hello world`)
//! - `font`  catalog id or family name (default `roboto`)
//! - `style` exact variant name (default `regular`)
//! - `size`  positive integer (default 72)
//! - `color` 3, 4, 6 or 8 hex digits (default: no fill override); a leading `#`,
//!   sent as `%23`, is accepted too
//!
//! Successful responses are `image/svg+xml` with a shared-cache `Cache-Control`.
//! Failures are JSON `{"message": ...}`; see [`status_for`] for the status mapping.

use std::sync::Arc;

use anyhow::Context as _;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::config::{CachePolicy, ServiceConfig};
use crate::render::HexColor;
use crate::service::{ServiceError, TextRequest, TextToSvgService};

pub const TEXT_TO_SVG_ROUTE: &str = "/api/text-to-svg";
pub const RENDER_SVG_ROUTE: &str = "/render.svg";

/// Raw query parameters. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct TextQuery {
    pub text: Option<String>,
    pub font: Option<String>,
    pub style: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl TextQuery {
    /// Apply defaults and validate.
    pub fn into_request(self) -> Result<TextRequest, ServiceError> {
        let mut request = TextRequest::default();

        // `text=` renders nothing, which is a legitimate request.
        if let Some(text) = self.text {
            request.text = text;
        }
        if let Some(font) = non_empty(self.font) {
            request.font = font;
        }
        if let Some(style) = non_empty(self.style) {
            request.style = style;
        }
        if let Some(size) = non_empty(self.size) {
            request.options.font_size = match size.trim().parse::<u32>() {
                Ok(n) if n > 0 => f64::from(n),
                _ => {
                    return Err(ServiceError::InvalidParameter {
                        param: "size",
                        value: size,
                    });
                }
            };
        }
        if let Some(color) = non_empty(self.color) {
            request.options.color = Some(HexColor::parse(&color).ok_or(
                ServiceError::InvalidParameter {
                    param: "color",
                    value: color,
                },
            )?);
        }

        Ok(request)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// HTTP status for a request failure.
pub fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::InvalidParameter { .. }
        | ServiceError::Resolve(_)
        | ServiceError::Download { .. } => StatusCode::BAD_REQUEST,
        ServiceError::CatalogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Render(_) | ServiceError::RenderAborted(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        match &self {
            ServiceError::Render(e) => log::error!("request failed: {self}: {e:?}"),
            ServiceError::RenderAborted(e) => log::error!("request failed: {self}: {e}"),
            ServiceError::Download { source, .. } => log::warn!("request failed: {self}: {source}"),
            ServiceError::CatalogUnavailable(e) => log::warn!("request failed: {e}"),
            _ => log::warn!("request failed: {self}"),
        }
        (status, Json(serde_json::json!({ "message": self.to_string() }))).into_response()
    }
}

/// Shared handler state.
pub struct AppState {
    service: TextToSvgService,
    cache_control: HeaderValue,
    cors: bool,
}

impl AppState {
    pub fn new(service: TextToSvgService, cache_policy: CachePolicy, cors: bool) -> Self {
        let cache_control = HeaderValue::from_str(&cache_policy.header_value())
            .unwrap_or_else(|_| HeaderValue::from_static("no-cache"));
        Self {
            service,
            cache_control,
            cors,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(TEXT_TO_SVG_ROUTE, get(text_to_svg))
        .route(RENDER_SVG_ROUTE, get(text_to_svg))
        .with_state(Arc::new(state))
}

async fn text_to_svg(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TextQuery>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(query)) => match query.into_request() {
            Ok(request) => state.service.render(request).await,
            Err(e) => Err(e),
        },
        Err(rejection) => Err(ServiceError::InvalidParameter {
            param: "query",
            value: rejection.body_text(),
        }),
    };

    let mut response = match result {
        Ok(svg) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml")),
                (header::CACHE_CONTROL, state.cache_control.clone()),
            ],
            svg,
        )
            .into_response(),
        Err(e) => e.into_response(),
    };
    if state.cors {
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
    }
    response
}

/// Bind `config.bind` and serve until Ctrl-C.
pub async fn serve(service: TextToSvgService, config: &ServiceConfig) -> anyhow::Result<()> {
    let app = router(AppState::new(service, config.cache_policy, config.cors));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    log::info!(
        "listening on http://{}{}",
        listener.local_addr().unwrap_or(config.bind),
        TEXT_TO_SVG_ROUTE
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("cannot listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
            log::info!("shutting down");
        })
        .await
        .context("server error")
}
