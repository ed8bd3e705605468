//! Transport-neutral admin request and query-parameter decoding.

use axum::extract::Query;
use bytes::Bytes;
use http::{Method, Uri};

use super::operation::AdminError;

// ---------------------------------------------------------------------------
// QueryParams
// ---------------------------------------------------------------------------

/// Decoded query string: ordered key/value pairs, keys may repeat.
///
/// A key present without `=` (e.g. `detail`) decodes to an empty value.
/// Unknown keys are kept but never rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// Decodes the query string of `uri`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidQuery` if the query string is not valid
    /// `application/x-www-form-urlencoded` data.
    pub fn parse(uri: &Uri) -> Result<Self, AdminError> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
            .map_err(|rejection| AdminError::InvalidQuery(rejection.body_text()))?;
        Ok(Self(pairs))
    }

    /// First value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `key`, in the order supplied.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// A flag is true when present, whatever its value.
    #[must_use]
    pub fn has_flag(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// First non-empty value of a required key.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidQuery` naming the key when it is absent
    /// or empty.
    pub fn require(&self, key: &str) -> Result<&str, AdminError> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(AdminError::InvalidQuery(format!(
                "{key} should not be empty"
            ))),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// HttpRequest
// ---------------------------------------------------------------------------

/// One inbound admin request: method, full URI, decoded query and raw body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    uri: Uri,
    query: QueryParams,
    body: Bytes,
}

impl HttpRequest {
    /// # Errors
    ///
    /// Returns `AdminError::InvalidQuery` if the query string cannot be decoded.
    pub fn new(method: Method, uri: Uri, body: Bytes) -> Result<Self, AdminError> {
        let query = QueryParams::parse(&uri)?;
        Ok(Self {
            method,
            uri,
            query,
            body,
        })
    }

    /// Builds a GET request from a path-and-query string.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidQuery` if `target` is not a valid URI.
    pub fn get(target: &str) -> Result<Self, AdminError> {
        Self::new(Method::GET, parse_target(target)?, Bytes::new())
    }

    /// Builds a POST request from a path-and-query string and a body.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidQuery` if `target` is not a valid URI.
    pub fn post(target: &str, body: impl Into<Bytes>) -> Result<Self, AdminError> {
        Self::new(Method::POST, parse_target(target)?, body.into())
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The query string exactly as received, without the leading `?`.
    #[must_use]
    pub fn raw_query(&self) -> Option<&str> {
        self.uri.query().filter(|q| !q.is_empty())
    }

    #[must_use]
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

fn parse_target(target: &str) -> Result<Uri, AdminError> {
    target
        .parse::<Uri>()
        .map_err(|e| AdminError::InvalidQuery(format!("invalid request target {target}: {e}")))
}
