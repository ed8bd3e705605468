//! axum handlers and the state they share.

pub mod admin;
pub mod health;

pub use admin::admin_handler;
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use super::lifecycle::ServerLifecycle;
use crate::service::Dispatcher;
use crate::traits::MetaService;

/// State carried through axum extractors. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Admin operation table wrapped in its middleware.
    pub dispatcher: Dispatcher,
    /// Consulted directly by the health endpoints.
    pub meta: Arc<dyn MetaService>,
    pub lifecycle: Arc<ServerLifecycle>,
    /// Process start, for uptime.
    pub start_time: Instant,
}
