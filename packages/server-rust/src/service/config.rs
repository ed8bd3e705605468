use http::uri::Scheme;
use meta_admin_core::CommandLimits;

/// Whether read-only handlers must be served by the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReadPolicy {
    /// Reads redirect to the primary like writes do.
    #[default]
    LeaderOnly,
    /// Reads are answered from this node's (possibly stale) view.
    AnyReplica,
}

/// Service-level configuration for the admin handlers.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path segment every operation is registered under (`/meta/app`, ...).
    pub service_root: String,
    /// Guard policy for read-only handlers. `cluster` never redirects.
    pub read_policy: ReadPolicy,
    /// Number of storage-engine levels; bounds `target_level` of compactions.
    pub num_levels: i32,
    /// Scheme of `Location` headers in leader redirects. Set to `https`
    /// when the primary serves the admin API over TLS.
    pub redirect_scheme: Scheme,
}

impl ServerConfig {
    #[must_use]
    pub fn command_limits(&self) -> CommandLimits {
        CommandLimits {
            num_levels: self.num_levels,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_root: "meta".to_string(),
            read_policy: ReadPolicy::LeaderOnly,
            num_levels: CommandLimits::default().num_levels,
            redirect_scheme: Scheme::HTTP,
        }
    }
}
