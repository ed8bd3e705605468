//! In-memory [`MetaService`] seeded from a JSON cluster fixture.
//!
//! Leadership lives in an `ArcSwap` so every guard check reads the current
//! value without locking. Cluster state sits behind a `parking_lot::RwLock`
//! that is never held across an `.await`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use meta_admin_core::{
    AppInfo, AppSnapshot, BackupPolicyStatus, BulkLoadStartCommand, BulkLoadState,
    BulkLoadStatus, ClusterInfo, DuplicationEntry, DuplicationStatus, NodeInfo,
    PartitionBulkLoadState, PartitionConfiguration,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::service::operation::MetaError;
use crate::traits::{Leadership, MetaService};

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// One app as described in a fixture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppFixture {
    #[serde(flatten)]
    pub info: AppInfo,
    #[serde(default)]
    pub partitions: Vec<PartitionConfiguration>,
    #[serde(default)]
    pub duplications: Vec<DuplicationEntry>,
    #[serde(default)]
    pub bulk_load: Option<BulkLoadStatus>,
}

/// Initial cluster state of an [`InMemoryMetaService`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterFixture {
    pub apps: Vec<AppFixture>,
    pub nodes: Vec<NodeInfo>,
    pub cluster: ClusterInfo,
    pub backup_policies: Vec<BackupPolicyStatus>,
    pub duplication_enabled: bool,
    pub cold_backup_enabled: bool,
}

impl Default for ClusterFixture {
    fn default() -> Self {
        Self {
            apps: Vec::new(),
            nodes: Vec::new(),
            cluster: ClusterInfo::default(),
            backup_policies: Vec::new(),
            duplication_enabled: true,
            cold_backup_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryMetaService
// ---------------------------------------------------------------------------

struct ClusterModel {
    /// Keyed by app name.
    apps: BTreeMap<String, AppFixture>,
    nodes: Vec<NodeInfo>,
    cluster: ClusterInfo,
    backup_policies: Vec<BackupPolicyStatus>,
    duplication_enabled: bool,
    cold_backup_enabled: bool,
}

impl From<ClusterFixture> for ClusterModel {
    fn from(fixture: ClusterFixture) -> Self {
        Self {
            apps: fixture
                .apps
                .into_iter()
                .map(|app| (app.info.app_name.clone(), app))
                .collect(),
            nodes: fixture.nodes,
            cluster: fixture.cluster,
            backup_policies: fixture.backup_policies,
            duplication_enabled: fixture.duplication_enabled,
            cold_backup_enabled: fixture.cold_backup_enabled,
        }
    }
}

/// Metadata service whose whole state is held in process memory.
///
/// Starts as a follower with no known primary; call [`become_leader`] or
/// [`follow`] to change that.
///
/// [`become_leader`]: InMemoryMetaService::become_leader
/// [`follow`]: InMemoryMetaService::follow
pub struct InMemoryMetaService {
    local_address: String,
    leadership: ArcSwap<Leadership>,
    model: RwLock<ClusterModel>,
}

impl InMemoryMetaService {
    /// Creates an empty cluster served from `local_address`.
    #[must_use]
    pub fn new(local_address: impl Into<String>) -> Self {
        Self::from_fixture(local_address, ClusterFixture::default())
    }

    #[must_use]
    pub fn from_fixture(local_address: impl Into<String>, fixture: ClusterFixture) -> Self {
        Self {
            local_address: local_address.into(),
            leadership: ArcSwap::new(Arc::new(Leadership::follower(None))),
            model: RwLock::new(ClusterModel::from(fixture)),
        }
    }

    /// Reads a JSON [`ClusterFixture`] from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid fixture.
    pub fn load_fixture(local_address: impl Into<String>, path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        let fixture: ClusterFixture = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fixture {}", path.display()))?;
        info!(
            path = %path.display(),
            apps = fixture.apps.len(),
            nodes = fixture.nodes.len(),
            "loaded cluster fixture"
        );
        Ok(Self::from_fixture(local_address, fixture))
    }

    #[must_use]
    pub fn local_address(&self) -> &str {
        &self.local_address
    }

    pub fn set_leadership(&self, leadership: Leadership) {
        self.leadership.store(Arc::new(leadership));
    }

    /// Marks this node as the elected primary.
    pub fn become_leader(&self) {
        self.set_leadership(Leadership::leader(self.local_address.clone()));
    }

    /// Marks this node as a follower of `leader`.
    pub fn follow(&self, leader: impl Into<String>) {
        self.set_leadership(Leadership::follower(Some(leader.into())));
    }

    fn ensure_leader(&self) -> Result<(), MetaError> {
        if self.leadership.load().is_leader {
            Ok(())
        } else {
            Err(MetaError::LeadershipLost)
        }
    }
}

fn find_app<'a>(model: &'a ClusterModel, app_name: &str) -> Result<&'a AppFixture, MetaError> {
    model
        .apps
        .get(app_name)
        .ok_or_else(|| MetaError::AppNotFound(app_name.to_string()))
}

/// Looks up an app that must accept commands.
fn find_available_app_mut<'a>(
    model: &'a mut ClusterModel,
    app_name: &str,
) -> Result<&'a mut AppFixture, MetaError> {
    let app = model
        .apps
        .get_mut(app_name)
        .ok_or_else(|| MetaError::AppNotFound(app_name.to_string()))?;
    if !app.info.status.is_available() {
        return Err(MetaError::AppUnavailable {
            app_name: app_name.to_string(),
            status: app.info.status,
        });
    }
    Ok(app)
}

fn snapshot(app: &AppFixture) -> AppSnapshot {
    AppSnapshot {
        info: app.info.clone(),
        partitions: app.partitions.clone(),
    }
}

#[async_trait]
impl MetaService for InMemoryMetaService {
    fn is_current_leader(&self) -> bool {
        self.leadership.load().is_leader
    }

    fn current_leader_address(&self) -> Option<String> {
        self.leadership.load().leader_address.clone()
    }

    fn leadership(&self) -> Leadership {
        Leadership::clone(&self.leadership.load())
    }

    async fn get_app_info(&self, app_name: &str) -> Result<AppSnapshot, MetaError> {
        let model = self.model.read();
        find_app(&model, app_name).map(snapshot)
    }

    async fn list_apps(&self) -> Result<Vec<AppSnapshot>, MetaError> {
        let model = self.model.read();
        let mut apps: Vec<AppSnapshot> = model.apps.values().map(snapshot).collect();
        apps.sort_by_key(|app| app.info.app_id);
        Ok(apps)
    }

    async fn list_nodes(&self) -> Result<Vec<NodeInfo>, MetaError> {
        Ok(self.model.read().nodes.clone())
    }

    async fn get_cluster_info(&self) -> Result<ClusterInfo, MetaError> {
        let mut cluster = self.model.read().cluster.clone();
        cluster.primary_meta_server = self.current_leader_address().unwrap_or_default();
        Ok(cluster)
    }

    async fn get_app_envs(&self, app_name: &str) -> Result<BTreeMap<String, String>, MetaError> {
        let model = self.model.read();
        find_app(&model, app_name).map(|app| app.info.envs.clone())
    }

    async fn set_app_envs(
        &self,
        app_name: &str,
        envs: BTreeMap<String, String>,
    ) -> Result<(), MetaError> {
        self.ensure_leader()?;
        let mut model = self.model.write();
        let app = find_available_app_mut(&mut model, app_name)?;
        let keys: Vec<&String> = envs.keys().collect();
        info!(app = app_name, keys = ?keys, "updating app envs");
        app.info.envs.extend(envs);
        Ok(())
    }

    async fn get_backup_policy_status(
        &self,
        names: &[String],
    ) -> Result<Vec<BackupPolicyStatus>, MetaError> {
        let model = self.model.read();
        if !model.cold_backup_enabled {
            return Err(MetaError::OperationDisabled("cold backup"));
        }
        if names.is_empty() {
            return Ok(model.backup_policies.clone());
        }
        if let Some(missing) = names
            .iter()
            .find(|name| !model.backup_policies.iter().any(|p| &p.policy_name == *name))
        {
            return Err(MetaError::PolicyNotFound(missing.clone()));
        }
        Ok(model
            .backup_policies
            .iter()
            .filter(|policy| names.contains(&policy.policy_name))
            .cloned()
            .collect())
    }

    async fn get_duplication_status(
        &self,
        app_name: &str,
    ) -> Result<DuplicationStatus, MetaError> {
        let model = self.model.read();
        if !model.duplication_enabled {
            return Err(MetaError::OperationDisabled("duplication"));
        }
        let app = find_app(&model, app_name)?;
        Ok(DuplicationStatus {
            app_id: app.info.app_id,
            app_name: app.info.app_name.clone(),
            duplications: app.duplications.clone(),
        })
    }

    async fn start_bulk_load(&self, command: BulkLoadStartCommand) -> Result<(), MetaError> {
        self.ensure_leader()?;
        let mut model = self.model.write();
        let app = find_available_app_mut(&mut model, &command.app_name)?;
        if app
            .bulk_load
            .as_ref()
            .is_some_and(|status| status.app_status.is_active())
        {
            return Err(MetaError::BulkLoadAlreadyRunning(command.app_name));
        }
        let partitions = (0..app.info.partition_count)
            .map(|partition_index| PartitionBulkLoadState {
                partition_index,
                status: BulkLoadState::Downloading,
                download_progress: 0,
            })
            .collect();
        info!(
            app = %command.app_name,
            cluster = %command.cluster_name,
            provider = %command.file_provider_type,
            "bulk load admitted"
        );
        app.bulk_load = Some(BulkLoadStatus {
            app_name: command.app_name,
            app_status: BulkLoadState::Downloading,
            cluster_name: command.cluster_name,
            file_provider_type: command.file_provider_type,
            remote_root_path: command.remote_root_path,
            partitions,
        });
        Ok(())
    }

    async fn get_bulk_load_status(&self, app_name: &str) -> Result<BulkLoadStatus, MetaError> {
        let model = self.model.read();
        find_app(&model, app_name)?
            .bulk_load
            .clone()
            .ok_or_else(|| MetaError::NoActiveBulkLoad(app_name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
