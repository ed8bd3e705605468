//! Shared fixtures and test doubles for service-layer tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use meta_admin_core::{
    AppInfo, AppSnapshot, AppStatus, BackupPolicyStatus, BulkLoadStartCommand, BulkLoadStatus,
    ClusterInfo, DuplicationEntry, DuplicationFailMode, DuplicationState, DuplicationStatus,
    ManualCompactionCommand, MetaFunctionLevel, NodeInfo, NodeStatus, PartitionConfiguration,
    UsageScenario,
};
use parking_lot::Mutex;

use super::config::ServerConfig;
use super::operation::MetaError;
use super::router::MetaHttpService;
use crate::meta::{AppFixture, ClusterFixture, InMemoryMetaService};
use crate::traits::{Leadership, MetaService};

pub const N1: &str = "10.0.0.1:34801";
pub const N2: &str = "10.0.0.2:34801";
pub const N3: &str = "10.0.0.3:34801";
pub const N4: &str = "10.0.0.4:34801";

fn partition(index: u32, primary: Option<&str>, secondaries: &[&str]) -> PartitionConfiguration {
    PartitionConfiguration {
        partition_index: index,
        ballot: i64::from(index) + 3,
        primary: primary.map(str::to_string),
        secondaries: secondaries.iter().map(|s| (*s).to_string()).collect(),
        max_replica_count: 3,
    }
}

fn app_info(app_id: i32, app_name: &str, partition_count: u32) -> AppInfo {
    AppInfo {
        app_id,
        app_name: app_name.to_string(),
        app_type: "pegasus".to_string(),
        status: AppStatus::Available,
        partition_count,
        max_replica_count: 3,
        is_stateful: true,
        create_second: 1_700_000_000,
        envs: BTreeMap::from([(
            "rocksdb.usage_scenario".to_string(),
            "normal".to_string(),
        )]),
    }
}

fn backup_policy(name: &str, interval: u64, app_ids: Vec<i32>) -> BackupPolicyStatus {
    BackupPolicyStatus {
        policy_name: name.to_string(),
        backup_provider_type: "hdfs_service".to_string(),
        backup_interval_seconds: interval,
        app_ids,
        backup_history_count_to_keep: 3,
        start_time: "01:00".to_string(),
        is_disable: false,
    }
}

/// Two apps on four replica servers (one dead).
///
/// `t1` has 4 partitions: two fully healthy, one short of a replica and one
/// without a primary. `t2` has 2 fully healthy partitions.
pub fn sample_fixture() -> ClusterFixture {
    let t1 = AppFixture {
        info: app_info(1, "t1", 4),
        partitions: vec![
            partition(0, Some(N1), &[N2, N3]),
            partition(1, Some(N2), &[N3, N1]),
            partition(2, Some(N3), &[N1]),
            partition(3, None, &[N1]),
        ],
        duplications: vec![DuplicationEntry {
            dupid: 1_700_000_100,
            remote: "backup_cluster".to_string(),
            status: DuplicationState::Log,
            create_ts: 1_700_000_100_000,
            fail_mode: DuplicationFailMode::Slow,
            progress: BTreeMap::from([(0, 120), (1, 98), (2, 77), (3, -1)]),
        }],
        bulk_load: None,
    };
    let t2 = AppFixture {
        info: app_info(2, "t2", 2),
        partitions: vec![
            partition(0, Some(N1), &[N2, N3]),
            partition(1, Some(N2), &[N1, N3]),
        ],
        duplications: Vec::new(),
        bulk_load: None,
    };
    ClusterFixture {
        apps: vec![t1, t2],
        nodes: vec![
            NodeInfo { address: N1.to_string(), status: NodeStatus::Alive },
            NodeInfo { address: N2.to_string(), status: NodeStatus::Alive },
            NodeInfo { address: N3.to_string(), status: NodeStatus::Alive },
            NodeInfo { address: N4.to_string(), status: NodeStatus::Unalive },
        ],
        cluster: ClusterInfo {
            meta_servers: vec!["meta-1:34601".to_string(), "meta-2:34601".to_string()],
            primary_meta_server: String::new(),
            zookeeper_hosts: vec!["zk1:2181".to_string()],
            zookeeper_root: "/pegasus/onebox".to_string(),
            meta_function_level: MetaFunctionLevel::Steady,
            version: "2.5.0".to_string(),
            http_port: 34601,
        },
        backup_policies: vec![
            backup_policy("daily", 86_400, vec![1]),
            backup_policy("weekly", 604_800, vec![1, 2]),
        ],
        duplication_enabled: true,
        cold_backup_enabled: true,
    }
}

/// Sample cluster served by `meta-1:34601`, currently primary.
pub fn leader_meta() -> Arc<InMemoryMetaService> {
    let meta = Arc::new(InMemoryMetaService::from_fixture(
        "meta-1:34601",
        sample_fixture(),
    ));
    meta.become_leader();
    meta
}

/// `MetaService` double that records every collaborator call by name.
///
/// With [`demote_on_write`](Self::demote_on_write) set, the inner service
/// loses leadership right before each mutating call, after the guard ran.
pub struct RecordingMetaService {
    inner: Arc<InMemoryMetaService>,
    calls: Mutex<Vec<&'static str>>,
    demote_to: Mutex<Option<String>>,
}

impl RecordingMetaService {
    pub fn new(inner: Arc<InMemoryMetaService>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            demote_to: Mutex::new(None),
        }
    }

    pub fn demote_on_write(&self, new_leader: &str) {
        *self.demote_to.lock() = Some(new_leader.to_string());
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().push(name);
    }

    fn record_write(&self, name: &'static str) {
        self.record(name);
        if let Some(leader) = self.demote_to.lock().take() {
            self.inner.follow(leader);
        }
    }
}

#[async_trait]
impl MetaService for RecordingMetaService {
    fn is_current_leader(&self) -> bool {
        self.inner.is_current_leader()
    }

    fn current_leader_address(&self) -> Option<String> {
        self.inner.current_leader_address()
    }

    fn leadership(&self) -> Leadership {
        self.inner.leadership()
    }

    async fn get_app_info(&self, app_name: &str) -> Result<AppSnapshot, MetaError> {
        self.record("get_app_info");
        self.inner.get_app_info(app_name).await
    }

    async fn list_apps(&self) -> Result<Vec<AppSnapshot>, MetaError> {
        self.record("list_apps");
        self.inner.list_apps().await
    }

    async fn list_nodes(&self) -> Result<Vec<NodeInfo>, MetaError> {
        self.record("list_nodes");
        self.inner.list_nodes().await
    }

    async fn get_cluster_info(&self) -> Result<ClusterInfo, MetaError> {
        self.record("get_cluster_info");
        self.inner.get_cluster_info().await
    }

    async fn get_app_envs(&self, app_name: &str) -> Result<BTreeMap<String, String>, MetaError> {
        self.record("get_app_envs");
        self.inner.get_app_envs(app_name).await
    }

    async fn set_app_envs(
        &self,
        app_name: &str,
        envs: BTreeMap<String, String>,
    ) -> Result<(), MetaError> {
        self.record_write("set_app_envs");
        self.inner.set_app_envs(app_name, envs).await
    }

    async fn get_backup_policy_status(
        &self,
        names: &[String],
    ) -> Result<Vec<BackupPolicyStatus>, MetaError> {
        self.record("get_backup_policy_status");
        self.inner.get_backup_policy_status(names).await
    }

    async fn get_duplication_status(
        &self,
        app_name: &str,
    ) -> Result<DuplicationStatus, MetaError> {
        self.record("get_duplication_status");
        self.inner.get_duplication_status(app_name).await
    }

    async fn start_bulk_load(&self, command: BulkLoadStartCommand) -> Result<(), MetaError> {
        self.record_write("start_bulk_load");
        self.inner.start_bulk_load(command).await
    }

    async fn get_bulk_load_status(&self, app_name: &str) -> Result<BulkLoadStatus, MetaError> {
        self.record("get_bulk_load_status");
        self.inner.get_bulk_load_status(app_name).await
    }

    async fn start_manual_compaction(
        &self,
        command: ManualCompactionCommand,
    ) -> Result<(), MetaError> {
        self.record_write("start_manual_compaction");
        self.inner.start_manual_compaction(command).await
    }

    async fn set_usage_scenario(
        &self,
        app_name: &str,
        scenario: UsageScenario,
    ) -> Result<(), MetaError> {
        self.record_write("set_usage_scenario");
        self.inner.set_usage_scenario(app_name, scenario).await
    }
}

/// Admin service over a recording double of the sample cluster.
pub fn recording_service(
    meta: Arc<InMemoryMetaService>,
) -> (MetaHttpService, Arc<RecordingMetaService>) {
    recording_service_with(meta, ServerConfig::default())
}

pub fn recording_service_with(
    meta: Arc<InMemoryMetaService>,
    config: ServerConfig,
) -> (MetaHttpService, Arc<RecordingMetaService>) {
    let recording = Arc::new(RecordingMetaService::new(meta));
    let service = MetaHttpService::new(recording.clone(), Arc::new(config));
    (service, recording)
}
