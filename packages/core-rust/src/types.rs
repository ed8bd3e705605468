//! Cluster descriptor types returned by the metadata service.
//!
//! These are the read-side shapes the admin handlers render: apps and their
//! partition configurations, replica servers, cluster-wide metadata, backup
//! policies, duplications and bulk-load progress. All enums serialize as
//! `snake_case` strings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Apps
// ---------------------------------------------------------------------------

/// Lifecycle status of an app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    #[default]
    Available,
    Creating,
    Dropping,
    Dropped,
    Recalling,
}

impl AppStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Creating => "creating",
            Self::Dropping => "dropping",
            Self::Dropped => "dropped",
            Self::Recalling => "recalling",
        }
    }

    /// Only available apps accept admin commands.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// General information about an app (table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub app_id: i32,
    pub app_name: String,
    #[serde(default = "default_app_type")]
    pub app_type: String,
    #[serde(default)]
    pub status: AppStatus,
    pub partition_count: u32,
    pub max_replica_count: u32,
    #[serde(default = "default_true")]
    pub is_stateful: bool,
    /// Unix seconds.
    #[serde(default)]
    pub create_second: u64,
    #[serde(default)]
    pub envs: BTreeMap<String, String>,
}

fn default_app_type() -> String {
    "pegasus".to_string()
}

const fn default_true() -> bool {
    true
}

/// Replica placement of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfiguration {
    pub partition_index: u32,
    pub ballot: i64,
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub secondaries: Vec<String>,
    pub max_replica_count: u32,
}

impl PartitionConfiguration {
    /// Primary plus secondaries.
    #[must_use]
    pub fn replica_count(&self) -> u32 {
        let secondaries = u32::try_from(self.secondaries.len()).unwrap_or(u32::MAX);
        secondaries.saturating_add(u32::from(self.primary.is_some()))
    }
}

/// Partition health counters of one app.
///
/// A partition without a primary is both read- and write-unhealthy. A
/// partition with a primary but fewer than two replicas can still serve
/// reads but not writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthSummary {
    pub fully_healthy_partition_count: u32,
    pub unhealthy_partition_count: u32,
    pub write_unhealthy_partition_count: u32,
    pub read_unhealthy_partition_count: u32,
}

impl HealthSummary {
    #[must_use]
    pub fn from_partitions(partitions: &[PartitionConfiguration]) -> Self {
        let mut summary = Self::default();
        for partition in partitions {
            let replicas = partition.replica_count();
            if partition.primary.is_none() {
                summary.write_unhealthy_partition_count += 1;
                summary.read_unhealthy_partition_count += 1;
            } else if replicas >= partition.max_replica_count {
                summary.fully_healthy_partition_count += 1;
            } else if replicas < 2 {
                summary.write_unhealthy_partition_count += 1;
            }
        }
        let total = u32::try_from(partitions.len()).unwrap_or(u32::MAX);
        summary.unhealthy_partition_count = total - summary.fully_healthy_partition_count;
        summary
    }
}

/// An app with its partition configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub info: AppInfo,
    #[serde(default)]
    pub partitions: Vec<PartitionConfiguration>,
}

// ---------------------------------------------------------------------------
// Replica servers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Alive,
    Unalive,
}

/// A replica server known to the metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub address: String,
    pub status: NodeStatus,
}

// ---------------------------------------------------------------------------
// Cluster
// ---------------------------------------------------------------------------

/// How aggressively the metadata service balances replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaFunctionLevel {
    Stopped,
    Blind,
    Freezed,
    #[default]
    Steady,
    Lively,
}

/// Cluster-wide metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterInfo {
    pub meta_servers: Vec<String>,
    pub primary_meta_server: String,
    pub zookeeper_hosts: Vec<String>,
    pub zookeeper_root: String,
    pub meta_function_level: MetaFunctionLevel,
    pub version: String,
    pub http_port: u16,
}

// ---------------------------------------------------------------------------
// Backup policies
// ---------------------------------------------------------------------------

/// Status of a cold backup policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPolicyStatus {
    pub policy_name: String,
    pub backup_provider_type: String,
    pub backup_interval_seconds: u64,
    #[serde(default)]
    pub app_ids: Vec<i32>,
    pub backup_history_count_to_keep: u32,
    /// Daily start time, `HH:MM`.
    pub start_time: String,
    #[serde(default)]
    pub is_disable: bool,
}

// ---------------------------------------------------------------------------
// Duplication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicationState {
    Init,
    Prepare,
    App,
    Log,
    Pause,
    Removed,
}

/// What a duplication does when shipping mutations keeps failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicationFailMode {
    #[default]
    Slow,
    Skip,
    Never,
}

/// One duplication of an app to a remote cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicationEntry {
    pub dupid: i32,
    /// Remote cluster name.
    pub remote: String,
    pub status: DuplicationState,
    /// Unix milliseconds.
    pub create_ts: u64,
    #[serde(default)]
    pub fail_mode: DuplicationFailMode,
    /// Partition index -> last confirmed decree.
    #[serde(default)]
    pub progress: BTreeMap<u32, i64>,
}

/// Every duplication of one app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicationStatus {
    pub app_id: i32,
    pub app_name: String,
    pub duplications: Vec<DuplicationEntry>,
}

// ---------------------------------------------------------------------------
// Bulk load
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkLoadState {
    #[default]
    Invalid,
    Downloading,
    Downloaded,
    Ingesting,
    Succeed,
    Failed,
    Pausing,
    Paused,
    Canceled,
}

impl BulkLoadState {
    /// A bulk load in one of these states blocks a new one from starting.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::Downloading | Self::Downloaded | Self::Ingesting | Self::Pausing | Self::Paused
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionBulkLoadState {
    pub partition_index: u32,
    pub status: BulkLoadState,
    /// Download progress in percent.
    #[serde(default)]
    pub download_progress: u32,
}

/// Bulk load snapshot of one app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkLoadStatus {
    pub app_name: String,
    pub app_status: BulkLoadState,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub file_provider_type: String,
    #[serde(default)]
    pub remote_root_path: String,
    #[serde(default)]
    pub partitions: Vec<PartitionBulkLoadState>,
}

impl BulkLoadStatus {
    /// Aggregate progress in percent.
    ///
    /// Once the download phase is over every partition counts as complete.
    #[must_use]
    pub fn progress(&self) -> u32 {
        match self.app_status {
            BulkLoadState::Downloaded | BulkLoadState::Ingesting | BulkLoadState::Succeed => 100,
            _ if self.partitions.is_empty() => 0,
            _ => {
                let total: u64 = self
                    .partitions
                    .iter()
                    .map(|p| u64::from(p.download_progress.min(100)))
                    .sum();
                let count = self.partitions.len() as u64;
                u32::try_from(total / count).unwrap_or(100)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
