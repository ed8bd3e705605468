use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use meta_admin_core::{
    AppSnapshot, BackupPolicyStatus, BulkLoadStartCommand, BulkLoadStatus, ClusterInfo,
    DuplicationStatus, ManualCompactionCommand, NodeInfo, UsageScenario,
};

use crate::service::operation::MetaError;

/// Leadership as observed at one instant.
///
/// Never cached across requests: the leader can change between two calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leadership {
    /// `true` if this node is the elected primary meta server.
    pub is_leader: bool,
    /// `host:port` of the node believed to be primary, if known.
    pub leader_address: Option<String>,
}

impl Leadership {
    #[must_use]
    pub fn leader(address: impl Into<String>) -> Self {
        Self {
            is_leader: true,
            leader_address: Some(address.into()),
        }
    }

    #[must_use]
    pub fn follower(leader_address: Option<String>) -> Self {
        Self {
            is_leader: false,
            leader_address,
        }
    }
}

/// Operation surface of the metadata service consumed by the admin handlers.
///
/// The admin layer holds no locks across these calls and never retries them.
/// Mutating operations must fail with `MetaError::LeadershipLost` if this
/// node stops being primary between admission and execution.
#[async_trait]
pub trait MetaService: Send + Sync {
    /// Returns `true` if this node is the current primary.
    fn is_current_leader(&self) -> bool;

    /// Returns the `host:port` of the current primary, if known.
    fn current_leader_address(&self) -> Option<String>;

    /// Reads both leadership facts. Implementations backed by a single
    /// snapshot should override this so the two facts agree.
    fn leadership(&self) -> Leadership {
        Leadership {
            is_leader: self.is_current_leader(),
            leader_address: self.current_leader_address(),
        }
    }

    /// Looks up one app with its partition configurations.
    async fn get_app_info(&self, app_name: &str) -> Result<AppSnapshot, MetaError>;

    /// Lists every known app.
    async fn list_apps(&self) -> Result<Vec<AppSnapshot>, MetaError>;

    /// Lists every known replica server.
    async fn list_nodes(&self) -> Result<Vec<NodeInfo>, MetaError>;

    async fn get_cluster_info(&self) -> Result<ClusterInfo, MetaError>;

    async fn get_app_envs(&self, app_name: &str) -> Result<BTreeMap<String, String>, MetaError>;

    /// Merges `envs` into the app's environment.
    async fn set_app_envs(
        &self,
        app_name: &str,
        envs: BTreeMap<String, String>,
    ) -> Result<(), MetaError>;

    /// Status of the named backup policies; an empty slice means all policies.
    async fn get_backup_policy_status(
        &self,
        names: &[String],
    ) -> Result<Vec<BackupPolicyStatus>, MetaError>;

    async fn get_duplication_status(&self, app_name: &str)
        -> Result<DuplicationStatus, MetaError>;

    /// Admits a bulk load; the download itself proceeds in the background.
    async fn start_bulk_load(&self, command: BulkLoadStartCommand) -> Result<(), MetaError>;

    async fn get_bulk_load_status(&self, app_name: &str) -> Result<BulkLoadStatus, MetaError>;

    /// Schedules a manual compaction by writing its app envs.
    async fn start_manual_compaction(
        &self,
        command: ManualCompactionCommand,
    ) -> Result<(), MetaError> {
        let now_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        self.set_app_envs(&command.app_name, command.to_app_envs(now_secs))
            .await
    }

    /// Switches the app's storage tuning profile by writing its app env.
    async fn set_usage_scenario(
        &self,
        app_name: &str,
        scenario: UsageScenario,
    ) -> Result<(), MetaError> {
        self.set_app_envs(app_name, scenario.to_app_envs()).await
    }
}
