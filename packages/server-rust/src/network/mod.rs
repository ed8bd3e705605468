//! HTTP transport: configuration, middleware, handlers and the listener.

pub mod config;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod module;

pub use config::{NetworkConfig, TlsConfig};
pub use handlers::AppState;
pub use lifecycle::{LifecycleState, ServerLifecycle};
pub use module::NetworkModule;
