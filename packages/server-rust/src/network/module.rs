//! Network module with deferred startup lifecycle.
//!
//! `new()` builds the admin service and router state, `start()` binds the
//! TCP listener, and `serve()` accepts connections until shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::http::uri::Scheme;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    admin_handler, health_handler, liveness_handler, readiness_handler, AppState,
};
use super::lifecycle::ServerLifecycle;
use super::middleware::build_http_layers;
use crate::service::{build_dispatch_pipeline, MetaHttpService, ServerConfig};
use crate::traits::MetaService;

/// Owns the admin listener from bind to drain.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Builds the admin service over `meta` without binding any port.
    ///
    /// With TLS configured, leader redirects point at `https://`.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        server_config: Arc<ServerConfig>,
        meta: Arc<dyn MetaService>,
    ) -> Self {
        let server_config = if config.tls.is_some() {
            Arc::new(ServerConfig {
                redirect_scheme: Scheme::HTTPS,
                ..ServerConfig::clone(&server_config)
            })
        } else {
            server_config
        };
        let service = MetaHttpService::new(Arc::clone(&meta), server_config);
        let state = AppState {
            dispatcher: build_dispatch_pipeline(service),
            meta,
            lifecycle: Arc::new(ServerLifecycle::new()),
            start_time: Instant::now(),
        };
        Self {
            config,
            listener: None,
            state,
        }
    }

    #[must_use]
    pub fn lifecycle(&self) -> Arc<ServerLifecycle> {
        Arc::clone(&self.state.lifecycle)
    }

    /// Routes:
    /// - `GET /health`, `GET /health/live`, `GET /health/ready`
    /// - everything else: the admin operation table
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .fallback(admin_handler)
            .layer(build_http_layers(&self.config))
            .with_state(self.state.clone())
    }

    /// Binds the listener; returns the bound port (OS-assigned for port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();
        info!(host = %self.config.host, port, "admin listener bound");
        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called, TLS material cannot be
    /// loaded, or the server hits a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener.take() else {
            anyhow::bail!("start() must be called before serve()");
        };
        let router = self.build_router();
        let lifecycle = Arc::clone(&self.state.lifecycle);

        lifecycle.mark_serving();
        match &self.config.tls {
            Some(tls) => serve_tls(listener, router, tls, shutdown).await?,
            None => serve_plain(listener, router, shutdown).await?,
        }

        lifecycle.begin_drain();
        if lifecycle.wait_for_drain(self.config.drain_timeout).await {
            info!("admin listener drained");
        } else {
            warn!(
                in_flight = lifecycle.in_flight_count(),
                "drain timeout expired with admin requests still running"
            );
        }
        Ok(())
    }
}

async fn serve_plain(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("serving plain HTTP");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Serves TLS via `axum-server`, reusing the pre-bound listener.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls: &TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!(%addr, "serving HTTPS");
    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}
