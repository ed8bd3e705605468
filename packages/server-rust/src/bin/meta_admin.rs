//! `meta-admin`: serves the meta HTTP admin API over an in-memory cluster.
//!
//! ```bash
//! # Primary for a fixture cluster
//! meta-admin --port 34601 --advertise-address meta-1:34601 --fixture cluster.json
//!
//! # Follower that redirects to meta-1
//! meta-admin --port 34602 --advertise-address meta-2:34602 --leader-address meta-1:34601
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use meta_admin_server::meta::InMemoryMetaService;
use meta_admin_server::network::{NetworkConfig, NetworkModule, TlsConfig};
use meta_admin_server::service::{ReadPolicy, ServerConfig};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Leader-aware HTTP admin API for a sharded metadata service.
#[derive(Debug, Parser)]
#[command(name = "meta-admin", version)]
struct Args {
    /// Bind address.
    #[arg(long, env = "META_ADMIN_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "META_ADMIN_PORT", default_value_t = 34601)]
    port: u16,

    /// `host:port` other nodes use to reach this one; used in redirects.
    #[arg(long, env = "META_ADMIN_ADVERTISE_ADDRESS")]
    advertise_address: Option<String>,

    /// Primary to follow. Without it this node acts as primary.
    #[arg(long, env = "META_ADMIN_LEADER_ADDRESS")]
    leader_address: Option<String>,

    #[arg(long, env = "META_ADMIN_READ_POLICY", value_enum, default_value_t = ReadPolicy::LeaderOnly)]
    read_policy: ReadPolicy,

    /// JSON cluster fixture to seed the in-memory metadata.
    #[arg(long, env = "META_ADMIN_FIXTURE")]
    fixture: Option<PathBuf>,

    /// Storage engine level count; bounds compaction `target_level`.
    #[arg(long, env = "META_ADMIN_NUM_LEVELS", default_value_t = 7)]
    num_levels: i32,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "META_ADMIN_METRICS_PORT")]
    metrics_port: Option<u16>,

    #[arg(long, env = "META_ADMIN_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[arg(long, env = "META_ADMIN_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    #[arg(long, env = "META_ADMIN_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,
}

fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init(),
    }
}

fn install_metrics_exporter(host: &str, port: u16) -> anyhow::Result<()> {
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("invalid metrics bind address {host}"))?;
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::new(ip, port))
        .install()
        .context("failed to install prometheus exporter")?;
    info!(port, "prometheus exporter listening");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);

    if let Some(port) = args.metrics_port {
        install_metrics_exporter(&args.host, port)?;
    }

    let advertise = args
        .advertise_address
        .clone()
        .unwrap_or_else(|| format!("{}:{}", args.host, args.port));
    let meta = match &args.fixture {
        Some(path) => InMemoryMetaService::load_fixture(advertise.clone(), path)?,
        None => InMemoryMetaService::new(advertise.clone()),
    };
    match &args.leader_address {
        Some(leader) if *leader != advertise => meta.follow(leader.clone()),
        _ => meta.become_leader(),
    }

    let server_config = ServerConfig {
        read_policy: args.read_policy,
        num_levels: args.num_levels,
        ..ServerConfig::default()
    };
    let tls = match (args.tls_cert, args.tls_key) {
        (Some(cert_path), Some(key_path)) => Some(TlsConfig {
            cert_path,
            key_path,
        }),
        _ => None,
    };
    let network_config = NetworkConfig {
        host: args.host,
        port: args.port,
        tls,
        ..NetworkConfig::default()
    };

    let mut module = NetworkModule::new(network_config, Arc::new(server_config), Arc::new(meta));
    let port = module.start().await?;
    info!(port, %advertise, read_policy = ?args.read_policy, "meta admin server started");
    module.serve(shutdown_signal()).await?;
    info!("meta admin server stopped");
    Ok(())
}
