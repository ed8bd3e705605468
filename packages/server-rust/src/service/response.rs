//! Admin responses: JSON bodies with an `error` envelope, plus redirects.

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::LOCATION;
use http::uri::Scheme;
use http::{HeaderValue, StatusCode};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::operation::{error_codes, AdminError};
use super::request::HttpRequest;

/// One admin response.
///
/// The body is always a JSON object whose `error` member holds
/// `{"code", "message"}`; payload fields sit beside it.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    status: StatusCode,
    body: Value,
    location: Option<String>,
    /// Registered route that produced this response, e.g. `/meta/apps`.
    matched_path: Option<String>,
}

fn envelope(code: &str, message: impl Into<String>) -> Value {
    json!({ "code": code, "message": message.into() })
}

impl HttpResponse {
    /// 200 with `payload`'s fields next to an `ERR_OK` envelope.
    ///
    /// Non-object payloads are placed under `result`.
    pub fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(Value::Object(mut fields)) => {
                fields.insert("error".to_string(), envelope(error_codes::OK, ""));
                Self::with_body(StatusCode::OK, Value::Object(fields))
            }
            Ok(other) => {
                let mut fields = Map::new();
                fields.insert("error".to_string(), envelope(error_codes::OK, ""));
                fields.insert("result".to_string(), other);
                Self::with_body(StatusCode::OK, Value::Object(fields))
            }
            Err(e) => Self::with_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": envelope(error_codes::INTERNAL, format!("failed to encode response: {e}")) }),
            ),
        }
    }

    /// 200 acknowledging an accepted command.
    pub fn ack(message: impl Into<String>) -> Self {
        Self::with_body(
            StatusCode::OK,
            json!({ "error": envelope(error_codes::OK, message) }),
        )
    }

    #[must_use]
    pub fn error(err: &AdminError) -> Self {
        Self::with_body(
            err.status(),
            json!({ "error": envelope(err.code(), err.to_string()) }),
        )
    }

    /// 307 pointing at `leader`, keeping the request's path and query so
    /// the caller can re-send the same request (method and body included).
    /// `scheme` is the one the primary serves the admin API on.
    #[must_use]
    pub fn redirect(scheme: &Scheme, leader: &str, req: &HttpRequest) -> Self {
        let mut location = format!("{scheme}://{leader}{}", req.path());
        if let Some(query) = req.raw_query() {
            location.push('?');
            location.push_str(query);
        }
        Self {
            status: StatusCode::TEMPORARY_REDIRECT,
            body: json!({
                "error": envelope(
                    error_codes::FORWARD_TO_OTHERS,
                    format!("this meta server is not primary, primary meta server is {leader}"),
                ),
                "primary_meta_server": leader,
            }),
            location: Some(location),
            matched_path: None,
        }
    }

    /// Adds one top-level field to the body.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        if let Value::Object(fields) = &mut self.body {
            fields.insert(key.to_string(), value);
        }
        self
    }

    /// Tags the response with the registered route that served it.
    #[must_use]
    pub(crate) fn with_matched_path(mut self, path: impl Into<String>) -> Self {
        self.matched_path = Some(path.into());
        self
    }

    fn with_body(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            location: None,
            matched_path: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Registered route of the operation that answered, `None` when the
    /// path matched nothing.
    #[must_use]
    pub fn matched_path(&self) -> Option<&str> {
        self.matched_path.as_deref()
    }

    /// The envelope's error code.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(value) = self
            .location
            .and_then(|location| HeaderValue::from_str(&location).ok())
        {
            response.headers_mut().insert(LOCATION, value);
        }
        response
    }
}
