//! Bridge from axum requests to the admin dispatcher.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;

use super::AppState;
use crate::service::{HttpRequest, HttpResponse};

/// Fallback handler: every path outside `/health*` goes to the operation
/// table, which answers unknown paths with its 404 listing.
pub async fn admin_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let _in_flight = state.lifecycle.track_request();

    let request = match HttpRequest::new(method, uri, body) {
        Ok(request) => request,
        Err(err) => return HttpResponse::error(&err).into_response(),
    };
    match state.dispatcher.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
