use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;
use serde::Serialize;
use serde_json::Value;

use super::operation::AdminError;
use super::request::HttpRequest;
use super::response::HttpResponse;

/// Future returned by every registered handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = HttpResponse> + Send>>;

/// A handler bound to the service it operates on.
pub type Handler = Arc<dyn Fn(HttpRequest) -> HandlerFuture + Send + Sync>;

// ---------------------------------------------------------------------------
// OperationDescriptor
// ---------------------------------------------------------------------------

/// One registered operation. Identity is `path`, unique within a registry.
pub struct OperationDescriptor {
    pub path: &'static str,
    pub method: Method,
    pub usage: &'static str,
    pub description: &'static str,
    /// Full request path, `/<root>/<path>`.
    route: String,
    handler: Handler,
}

impl OperationDescriptor {
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }
}

impl std::fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Help entry rendered for unknown paths.
#[derive(Debug, Serialize)]
struct OperationHelp {
    path: String,
    method: String,
    usage: &'static str,
    description: &'static str,
}

// ---------------------------------------------------------------------------
// OperationRegistry
// ---------------------------------------------------------------------------

/// Static table from path segment to handler, built once at startup.
///
/// Paths are relative to the service root: `app/start_bulk_load` is served
/// at `/<root>/app/start_bulk_load`. Registration order is preserved in the
/// help listing.
#[derive(Debug)]
pub struct OperationRegistry {
    root: String,
    operations: Vec<OperationDescriptor>,
    by_path: HashMap<&'static str, usize>,
}

impl OperationRegistry {
    /// Creates an empty registry serving under `/<root>/`.
    #[must_use]
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_matches('/').to_string(),
            operations: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    /// Registers one operation.
    ///
    /// # Panics
    ///
    /// Panics if `path` is already registered; duplicate registration is a
    /// startup bug, not a runtime condition.
    pub fn register(
        &mut self,
        path: &'static str,
        method: Method,
        handler: Handler,
        usage: &'static str,
        description: &'static str,
    ) {
        assert!(
            !self.by_path.contains_key(path),
            "operation {path} registered twice"
        );
        let route = if self.root.is_empty() {
            format!("/{path}")
        } else {
            format!("/{}/{path}", self.root)
        };
        self.by_path.insert(path, self.operations.len());
        self.operations.push(OperationDescriptor {
            path,
            method,
            usage,
            description,
            route,
            handler,
        });
    }

    /// Registered operations in registration order.
    #[must_use]
    pub fn descriptors(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Looks up the operation serving `path` (a full request path).
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&OperationDescriptor> {
        let relative = self.relative_path(path)?;
        self.by_path.get(relative).map(|&i| &self.operations[i])
    }

    /// Runs the handler registered for the request's path.
    ///
    /// Unknown paths and help requests (`/<root>` or `/<root>/help`) get a
    /// 404 listing every operation; a method mismatch gets a 405. Responses
    /// of a resolved operation carry its route as their matched path.
    pub fn dispatch(&self, req: HttpRequest) -> HandlerFuture {
        let Some(descriptor) = self.resolve(req.path()) else {
            let response = self.not_found(req.path());
            return Box::pin(std::future::ready(response));
        };
        let route = descriptor.route.clone();
        if *req.method() != descriptor.method {
            let err = AdminError::MethodNotAllowed {
                path: req.path().to_string(),
                method: req.method().clone(),
                expected: descriptor.method.clone(),
            };
            let response = HttpResponse::error(&err).with_matched_path(route);
            return Box::pin(std::future::ready(response));
        }
        let fut = (descriptor.handler)(req);
        Box::pin(async move { fut.await.with_matched_path(route) })
    }

    /// JSON help listing: one entry per operation, in registration order.
    #[must_use]
    pub fn listing(&self) -> Value {
        let entries: Vec<OperationHelp> = self
            .operations
            .iter()
            .map(|op| OperationHelp {
                path: op.route.clone(),
                method: op.method.to_string(),
                usage: op.usage,
                description: op.description,
            })
            .collect();
        serde_json::to_value(entries).unwrap_or(Value::Null)
    }

    fn not_found(&self, path: &str) -> HttpResponse {
        let err = AdminError::NotFound {
            path: path.to_string(),
        };
        HttpResponse::error(&err).with_field("operations", self.listing())
    }

    fn relative_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix('/').unwrap_or(path);
        let rest = if self.root.is_empty() {
            rest
        } else {
            rest.strip_prefix(self.root.as_str())?.strip_prefix('/')?
        };
        Some(rest.trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
