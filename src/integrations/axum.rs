//! Axum HTTP surface.
//!
//! [`router`] builds the complete service:
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | `GET` | `/` | `Hello, World!` |
//! | `POST` | `/utils/convert-pdf` | Markdown body → `application/pdf` attachment |
//! | `GET` | `/health` | [`HealthResponse`](crate::HealthResponse) as JSON |
//! | any | anything else | `404`, body `<uri> Page not found` |
//!
//! Every request is logged with method, URI, status and latency. Requests
//! running past [`RouterLimits::request_timeout`] get `408`, and a panicking
//! handler becomes a `500` instead of a dropped connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use md2pdf_server::integrations::axum::router;
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router(pool.clone())).await?;
//! ```

use std::time::{Duration, Instant};

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{StatusCode, Uri, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;

use crate::SharedBrowserPool;
use crate::service::{convert_markdown_to_pdf_async, health_status};

/// Default maximum request body: 10 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Default deadline for a whole request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Axum `State` extractor for the shared pool.
pub type BrowserPoolState = State<SharedBrowserPool>;

/// Per-request limits applied by [`router_with_limits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterLimits {
    /// Largest accepted request body, in bytes.
    pub body_limit: usize,

    /// Requests still running after this get `408 Request Timeout`.
    pub request_timeout: Duration,
}

impl Default for RouterLimits {
    fn default() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Router with the default limits.
pub fn router(pool: SharedBrowserPool) -> Router {
    router_with_limits(pool, RouterLimits::default())
}

/// Router with custom limits.
pub fn router_with_limits(pool: SharedBrowserPool, limits: RouterLimits) -> Router {
    let routes = Router::new()
        .route("/", get(hello))
        .route("/utils/convert-pdf", post(convert_pdf))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(pool);

    with_middleware(routes, limits)
}

/// Applied innermost first, so the request log sees every final status.
fn with_middleware(routes: Router, limits: RouterLimits) -> Router {
    let timeout =
        TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limits.request_timeout);

    routes
        .layer(DefaultBodyLimit::max(limits.body_limit))
        .layer(timeout)
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(log_requests))
}

async fn hello() -> &'static str {
    "Hello, World!"
}

/// `POST /utils/convert-pdf`
///
/// The raw body is the Markdown source. The deadline is
/// [`PoolConfig::conversion_timeout`](crate::PoolConfig::conversion_timeout).
async fn convert_pdf(State(pool): BrowserPoolState, body: Bytes) -> Response {
    let timeout = pool.config().conversion_timeout;

    match convert_markdown_to_pdf_async(pool, body.to_vec(), timeout).await {
        Ok(pdf) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (header::CONTENT_DISPOSITION, pdf.content_disposition()),
            ],
            pdf.data,
        )
            .into_response(),
        Err(e) => {
            log::warn!("❌ Conversion failed [{}]: {}", e.error_code(), e);
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, format!("Conversion failed: {}", e)).into_response()
        }
    }
}

/// `GET /health`. Answers immediately, even while the browser starts.
async fn health(State(pool): BrowserPoolState) -> impl IntoResponse {
    Json(health_status(&pool))
}

async fn not_found(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{} Page not found", uri))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    log::info!(
        "{} {} {} {:?}",
        method,
        uri,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BrowserPool;
    use crate::factory::mock::MockBrowserFactory;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(factory: &MockBrowserFactory) -> Router {
        let pool = BrowserPool::builder()
            .factory(Box::new(factory.clone()))
            .build()
            .unwrap()
            .into_shared();
        router(pool)
    }

    #[tokio::test]
    async fn test_hello() {
        let response = app(&MockBrowserFactory::new())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Hello, World!");
    }

    #[tokio::test]
    async fn test_not_found_echoes_uri() {
        let response = app(&MockBrowserFactory::new())
            .oneshot(Request::builder().uri("/nope?x=1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"/nope?x=1 Page not found");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let pool = BrowserPool::builder()
            .factory(Box::new(MockBrowserFactory::new()))
            .build()
            .unwrap()
            .into_shared();
        let limits = RouterLimits {
            body_limit: 8,
            ..RouterLimits::default()
        };
        let response = router_with_limits(pool, limits)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/utils/convert-pdf")
                    .body(Body::from(vec![b'a'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    async fn broken_handler() -> &'static str {
        panic!("handler bug")
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_500() {
        let routes = Router::new().route("/broken", get(broken_handler));
        let response = with_middleware(routes, RouterLimits::default())
            .oneshot(Request::builder().uri("/broken").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let factory = MockBrowserFactory::new().with_conversion_delay(Duration::from_secs(2));
        let pool = BrowserPool::builder()
            .factory(Box::new(factory))
            .build()
            .unwrap()
            .into_shared();
        let limits = RouterLimits {
            request_timeout: Duration::from_millis(100),
            ..RouterLimits::default()
        };

        let started = Instant::now();
        let response = router_with_limits(pool, limits)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/utils/convert-pdf")
                    .body(Body::from("# slow"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
