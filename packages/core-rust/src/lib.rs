//! Meta admin core: command schemas, cluster descriptors, and app env keys.

pub mod commands;
pub mod types;

pub use commands::{
    decode_command, env_keys, AdminCommand, BottommostLevelPolicy, BulkLoadStartCommand,
    CommandError, CommandLimits, CompactionType, ManualCompactionCommand, UsageScenario,
    UsageScenarioCommand,
};
pub use types::{
    AppInfo, AppSnapshot, AppStatus, BackupPolicyStatus, BulkLoadState, BulkLoadStatus,
    ClusterInfo, DuplicationEntry, DuplicationFailMode, DuplicationState, DuplicationStatus,
    HealthSummary, MetaFunctionLevel, NodeInfo, NodeStatus, PartitionBulkLoadState,
    PartitionConfiguration,
};

