//! Admin operation handlers.
//!
//! Every handler is an `async fn(HandlerContext, HttpRequest) ->
//! Result<HttpResponse, AdminError>`. Handlers that mutate cluster state
//! call `LeadershipGuard::check_or_redirect` first; read-only handlers call
//! `check_read`, which honours the configured `ReadPolicy`. Validation
//! happens before any call into the metadata service.

pub mod app;
pub mod backup_policy;
pub mod bulk_load;
pub mod cluster;
pub mod compaction;
pub mod duplication;
pub mod nodes;
pub mod usage_scenario;

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use super::config::ServerConfig;
use super::guard::LeadershipGuard;
use super::operation::AdminError;
use super::registry::{Handler, HandlerFuture};
use super::request::HttpRequest;
use super::response::HttpResponse;
use crate::traits::MetaService;

/// Everything a handler needs, cheap to clone into each invocation.
#[derive(Clone)]
pub struct HandlerContext {
    pub meta: Arc<dyn MetaService>,
    pub guard: LeadershipGuard,
    pub config: Arc<ServerConfig>,
}

impl HandlerContext {
    #[must_use]
    pub fn new(meta: Arc<dyn MetaService>, config: Arc<ServerConfig>) -> Self {
        let guard = LeadershipGuard::new(
            Arc::clone(&meta),
            config.read_policy,
            config.redirect_scheme.clone(),
        );
        Self {
            meta,
            guard,
            config,
        }
    }
}

/// Binds a handler function to `ctx`, rendering its errors as responses.
pub(crate) fn bind<F, Fut>(ctx: &HandlerContext, handler: F) -> Handler
where
    F: Fn(HandlerContext, HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, AdminError>> + Send + 'static,
{
    let ctx = ctx.clone();
    Arc::new(move |req: HttpRequest| -> HandlerFuture {
        let path = req.path().to_string();
        let fut = handler(ctx.clone(), req);
        Box::pin(async move {
            match fut.await {
                Ok(response) => response,
                Err(err) => {
                    if err.is_server_error() {
                        warn!(path = %path, error = %err, "admin request failed");
                    } else {
                        debug!(path = %path, error = %err, "admin request rejected");
                    }
                    HttpResponse::error(&err)
                }
            }
        })
    })
}
