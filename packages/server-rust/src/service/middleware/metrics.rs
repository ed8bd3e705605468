//! Request metrics for the admin dispatcher.
//!
//! Every request gets an `admin_request` span carrying its path, status and
//! duration, plus `meta_http_requests_total{path,status}` and
//! `meta_http_request_duration_seconds{path}` in the `metrics` registry.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::request::HttpRequest;
use crate::service::response::HttpResponse;

/// Label used for requests that matched no operation, so unknown paths do
/// not create new series.
const UNMATCHED_PATH: &str = "unmatched";

/// Metric label for a response: the registered route, never the raw path,
/// so `/meta/apps/` and `/meta/apps` share one series.
fn path_label(response: &HttpResponse) -> String {
    response
        .matched_path()
        .unwrap_or(UNMATCHED_PATH)
        .to_string()
}

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records duration and outcome of each admin request.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<HttpRequest> for MetricsService<S>
where
    S: Service<HttpRequest, Response = HttpResponse, Error = Infallible> + Send,
    S::Future: Send + 'static,
{
    type Response = HttpResponse;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        let span = info_span!(
            "admin_request",
            method = %req.method(),
            path = %req.path(),
            status = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );

        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let start = Instant::now();
                let response = match fut.await {
                    Ok(response) => response,
                    Err(never) => match never {},
                };
                let elapsed = start.elapsed();

                let status = response.status();
                let label = path_label(&response);

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                let span = tracing::Span::current();
                span.record("status", status.as_u16());
                span.record("duration_ms", duration_ms);

                metrics::counter!(
                    "meta_http_requests_total",
                    "path" => label.clone(),
                    "status" => status.as_str().to_string()
                )
                .increment(1);
                metrics::histogram!("meta_http_request_duration_seconds", "path" => label)
                    .record(elapsed.as_secs_f64());

                tracing::debug!(status = status.as_u16(), duration_ms, "admin request complete");

                Ok(response)
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
