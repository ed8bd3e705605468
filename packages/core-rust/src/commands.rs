//! Typed admin command bodies and their decode/validate boundary.
//!
//! The three POST commands (bulk load start, manual compaction, usage
//! scenario) arrive as JSON bodies. Decoding is structural first (serde),
//! then semantic (`AdminCommand::validate`). Enum-like fields are closed
//! enums, so an unknown value never makes it past `decode_command`.
//! Unknown JSON fields are ignored.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// App env keys
// ---------------------------------------------------------------------------

/// App environment keys written by compaction and usage-scenario commands.
pub mod env_keys {
    pub const MANUAL_COMPACT_DISABLED: &str = "manual_compact.disabled";
    pub const MANUAL_COMPACT_MAX_CONCURRENT_RUNNING_COUNT: &str =
        "manual_compact.max_concurrent_running_count";

    pub const MANUAL_COMPACT_ONCE_TRIGGER_TIME: &str = "manual_compact.once.trigger_time";
    pub const MANUAL_COMPACT_ONCE_TARGET_LEVEL: &str = "manual_compact.once.target_level";
    pub const MANUAL_COMPACT_ONCE_BOTTOMMOST_LEVEL_COMPACTION: &str =
        "manual_compact.once.bottommost_level_compaction";

    pub const MANUAL_COMPACT_PERIODIC_TRIGGER_TIME: &str = "manual_compact.periodic.trigger_time";
    pub const MANUAL_COMPACT_PERIODIC_TARGET_LEVEL: &str = "manual_compact.periodic.target_level";
    pub const MANUAL_COMPACT_PERIODIC_BOTTOMMOST_LEVEL_COMPACTION: &str =
        "manual_compact.periodic.bottommost_level_compaction";

    pub const ROCKSDB_USAGE_SCENARIO: &str = "rocksdb.usage_scenario";
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejection produced while decoding or validating a command body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("request body is empty")]
    EmptyBody,
    #[error("invalid request body: {0}")]
    Malformed(String),
    #[error("{field} should not be empty")]
    EmptyField { field: &'static str },
    #[error("trigger_time should not be empty when type is periodic")]
    MissingTriggerTime,
    #[error("trigger_time should be empty when type is once")]
    UnexpectedTriggerTime,
    #[error("target_level should be in [-1, {num_levels}], got {target_level}")]
    TargetLevelOutOfRange { target_level: i32, num_levels: i32 },
}

// ---------------------------------------------------------------------------
// Decode boundary
// ---------------------------------------------------------------------------

/// Storage-engine limits commands are validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLimits {
    /// Number of LSM levels; `target_level` may range over `[-1, num_levels]`.
    pub num_levels: i32,
}

impl Default for CommandLimits {
    fn default() -> Self {
        Self { num_levels: 7 }
    }
}

/// A JSON command body with semantic checks beyond its structure.
pub trait AdminCommand: DeserializeOwned {
    /// Checks invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    fn validate(&self, limits: &CommandLimits) -> Result<(), CommandError>;
}

/// Decodes and validates a command body.
///
/// # Errors
///
/// - `CommandError::EmptyBody` for an empty or whitespace-only body
/// - `CommandError::Malformed` for missing fields, type mismatches and
///   unknown enum values (the serde message names the offending field)
/// - any error returned by [`AdminCommand::validate`]
pub fn decode_command<C: AdminCommand>(
    body: &[u8],
    limits: &CommandLimits,
) -> Result<C, CommandError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(CommandError::EmptyBody);
    }
    let command: C =
        serde_json::from_slice(body).map_err(|e| CommandError::Malformed(e.to_string()))?;
    command.validate(limits)?;
    Ok(command)
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), CommandError> {
    if value.trim().is_empty() {
        Err(CommandError::EmptyField { field })
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Bulk load
// ---------------------------------------------------------------------------

/// Body of `app/start_bulk_load`. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkLoadStartCommand {
    pub app_name: String,
    pub cluster_name: String,
    pub file_provider_type: String,
    pub remote_root_path: String,
}

impl AdminCommand for BulkLoadStartCommand {
    fn validate(&self, _limits: &CommandLimits) -> Result<(), CommandError> {
        require_non_empty("app_name", &self.app_name)?;
        require_non_empty("cluster_name", &self.cluster_name)?;
        require_non_empty("file_provider_type", &self.file_provider_type)?;
        require_non_empty("remote_root_path", &self.remote_root_path)
    }
}

// ---------------------------------------------------------------------------
// Manual compaction
// ---------------------------------------------------------------------------

/// Whether a manual compaction runs once or on a recurring schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactionType {
    Periodic,
    Once,
}

impl CompactionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::Once => "once",
        }
    }
}

impl fmt::Display for CompactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the bottommost level is treated during a manual compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottommostLevelPolicy {
    Skip,
    Force,
}

impl BottommostLevelPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Force => "force",
        }
    }
}

impl fmt::Display for BottommostLevelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `app/start_compaction`.
///
/// Wire names follow the storage engine's env vocabulary (`type`,
/// `bottommost_level_compaction`); `compaction_type` and
/// `bottommost_level_policy` are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualCompactionCommand {
    pub app_name: String,
    #[serde(rename = "type", alias = "compaction_type")]
    pub compaction_type: CompactionType,
    pub target_level: i32,
    #[serde(
        rename = "bottommost_level_compaction",
        alias = "bottommost_level_policy"
    )]
    pub bottommost_level_policy: BottommostLevelPolicy,
    /// 0 means no concurrency limit.
    #[serde(default)]
    pub max_concurrent_running_count: u32,
    /// Only meaningful for periodic compactions, e.g. `"3:00,21:00"`.
    #[serde(default)]
    pub trigger_time: String,
}

impl AdminCommand for ManualCompactionCommand {
    fn validate(&self, limits: &CommandLimits) -> Result<(), CommandError> {
        // trigger_time is required iff the compaction is periodic.
        match (self.compaction_type, self.trigger_time.trim().is_empty()) {
            (CompactionType::Periodic, true) => return Err(CommandError::MissingTriggerTime),
            (CompactionType::Once, false) => return Err(CommandError::UnexpectedTriggerTime),
            _ => {}
        }
        require_non_empty("app_name", &self.app_name)?;
        if self.target_level < -1 || self.target_level > limits.num_levels {
            return Err(CommandError::TargetLevelOutOfRange {
                target_level: self.target_level,
                num_levels: limits.num_levels,
            });
        }
        Ok(())
    }
}

impl ManualCompactionCommand {
    /// Returns `true` when no concurrency limit applies.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.max_concurrent_running_count == 0
    }

    /// Translates the command into the app envs the replica servers watch.
    ///
    /// `now_secs` becomes the trigger time of a one-shot compaction.
    #[must_use]
    pub fn to_app_envs(&self, now_secs: u64) -> BTreeMap<String, String> {
        let (trigger_key, level_key, bottommost_key, trigger_time) = match self.compaction_type {
            CompactionType::Once => (
                env_keys::MANUAL_COMPACT_ONCE_TRIGGER_TIME,
                env_keys::MANUAL_COMPACT_ONCE_TARGET_LEVEL,
                env_keys::MANUAL_COMPACT_ONCE_BOTTOMMOST_LEVEL_COMPACTION,
                now_secs.to_string(),
            ),
            CompactionType::Periodic => (
                env_keys::MANUAL_COMPACT_PERIODIC_TRIGGER_TIME,
                env_keys::MANUAL_COMPACT_PERIODIC_TARGET_LEVEL,
                env_keys::MANUAL_COMPACT_PERIODIC_BOTTOMMOST_LEVEL_COMPACTION,
                self.trigger_time.clone(),
            ),
        };

        let mut envs = BTreeMap::new();
        envs.insert(
            env_keys::MANUAL_COMPACT_DISABLED.to_string(),
            "false".to_string(),
        );
        envs.insert(trigger_key.to_string(), trigger_time);
        envs.insert(level_key.to_string(), self.target_level.to_string());
        envs.insert(
            bottommost_key.to_string(),
            self.bottommost_level_policy.as_str().to_string(),
        );
        if !self.is_unlimited() {
            envs.insert(
                env_keys::MANUAL_COMPACT_MAX_CONCURRENT_RUNNING_COUNT.to_string(),
                self.max_concurrent_running_count.to_string(),
            );
        }
        envs
    }
}

// ---------------------------------------------------------------------------
// Usage scenario
// ---------------------------------------------------------------------------

/// Storage-engine tuning profile of an app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageScenario {
    Normal,
    BulkLoad,
}

impl UsageScenario {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::BulkLoad => "bulk_load",
        }
    }

    /// The single app env that selects this scenario.
    #[must_use]
    pub fn to_app_envs(self) -> BTreeMap<String, String> {
        BTreeMap::from([(
            env_keys::ROCKSDB_USAGE_SCENARIO.to_string(),
            self.as_str().to_string(),
        )])
    }
}

impl fmt::Display for UsageScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `app/usage_scenario`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageScenarioCommand {
    pub app_name: String,
    pub scenario: UsageScenario,
}

impl AdminCommand for UsageScenarioCommand {
    fn validate(&self, _limits: &CommandLimits) -> Result<(), CommandError> {
        require_non_empty("app_name", &self.app_name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn decode<C: AdminCommand>(body: &str) -> Result<C, CommandError> {
        decode_command(body.as_bytes(), &CommandLimits::default())
    }

    fn malformed_message(err: CommandError) -> String {
        match err {
            CommandError::Malformed(msg) => msg,
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    // ---- BulkLoadStartCommand ----

    #[test]
    fn bulk_load_decodes_all_fields() {
        let cmd: BulkLoadStartCommand = decode(
            r#"{"app_name":"t1","cluster_name":"c1","file_provider_type":"hdfs","remote_root_path":"/bulk"}"#,
        )
        .unwrap();
        assert_eq!(cmd.app_name, "t1");
        assert_eq!(cmd.cluster_name, "c1");
        assert_eq!(cmd.file_provider_type, "hdfs");
        assert_eq!(cmd.remote_root_path, "/bulk");
    }

    #[test]
    fn bulk_load_missing_field_names_it() {
        let err = decode::<BulkLoadStartCommand>(
            r#"{"app_name":"t1","cluster_name":"c1","file_provider_type":"hdfs"}"#,
        )
        .unwrap_err();
        assert!(malformed_message(err).contains("remote_root_path"));
    }

    #[test]
    fn bulk_load_ignores_unknown_fields() {
        let cmd: BulkLoadStartCommand = decode(
            r#"{"app_name":"t1","cluster_name":"c1","file_provider_type":"hdfs","remote_root_path":"/bulk","ingest_behind":true}"#,
        )
        .unwrap();
        assert_eq!(cmd.app_name, "t1");
    }

    #[test]
    fn bulk_load_rejects_empty_app_name() {
        let err = decode::<BulkLoadStartCommand>(
            r#"{"app_name":"","cluster_name":"c1","file_provider_type":"hdfs","remote_root_path":"/bulk"}"#,
        )
        .unwrap_err();
        assert_eq!(err, CommandError::EmptyField { field: "app_name" });
    }

    #[test]
    fn empty_body_is_rejected() {
        assert_eq!(
            decode::<BulkLoadStartCommand>("  \n").unwrap_err(),
            CommandError::EmptyBody
        );
    }

    #[test]
    fn non_object_body_is_malformed() {
        let err = decode::<UsageScenarioCommand>("[1,2,3]").unwrap_err();
        assert!(matches!(err, CommandError::Malformed(_)));
    }

    // ---- ManualCompactionCommand ----

    #[test]
    fn compaction_once_decodes_with_defaults() {
        let cmd: ManualCompactionCommand = decode(
            r#"{"app_name":"t1","type":"once","target_level":-1,"bottommost_level_compaction":"skip"}"#,
        )
        .unwrap();
        assert_eq!(cmd.compaction_type, CompactionType::Once);
        assert_eq!(cmd.bottommost_level_policy, BottommostLevelPolicy::Skip);
        assert_eq!(cmd.max_concurrent_running_count, 0);
        assert!(cmd.trigger_time.is_empty());
    }

    #[test]
    fn compaction_accepts_alias_field_names() {
        let cmd: ManualCompactionCommand = decode(
            r#"{"app_name":"t1","compaction_type":"periodic","target_level":2,"bottommost_level_policy":"force","trigger_time":"3:00"}"#,
        )
        .unwrap();
        assert_eq!(cmd.compaction_type, CompactionType::Periodic);
        assert_eq!(cmd.bottommost_level_policy, BottommostLevelPolicy::Force);
    }

    #[test]
    fn compaction_periodic_without_trigger_time_is_rejected() {
        let err = decode::<ManualCompactionCommand>(
            r#"{"app_name":"t1","type":"periodic","target_level":-1,"bottommost_level_compaction":"skip"}"#,
        )
        .unwrap_err();
        assert_eq!(err, CommandError::MissingTriggerTime);
    }

    #[test]
    fn compaction_once_with_trigger_time_is_rejected() {
        let err = decode::<ManualCompactionCommand>(
            r#"{"app_name":"t1","type":"once","target_level":-1,"bottommost_level_compaction":"skip","trigger_time":"3:00"}"#,
        )
        .unwrap_err();
        assert_eq!(err, CommandError::UnexpectedTriggerTime);
    }

    #[test]
    fn compaction_once_with_blank_trigger_time_is_accepted() {
        let cmd: ManualCompactionCommand = decode(
            r#"{"app_name":"t1","type":"once","target_level":-1,"bottommost_level_compaction":"skip","trigger_time":" "}"#,
        )
        .unwrap();
        assert_eq!(cmd.compaction_type, CompactionType::Once);
    }

    #[test]
    fn compaction_zero_concurrency_means_unlimited() {
        let cmd: ManualCompactionCommand = decode(
            r#"{"app_name":"t1","type":"once","target_level":0,"bottommost_level_compaction":"skip","max_concurrent_running_count":0}"#,
        )
        .unwrap();
        assert!(cmd.is_unlimited());
    }

    #[test]
    fn compaction_negative_concurrency_is_type_error() {
        let err = decode::<ManualCompactionCommand>(
            r#"{"app_name":"t1","type":"once","target_level":0,"bottommost_level_compaction":"skip","max_concurrent_running_count":-3}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Malformed(_)));
    }

    #[test]
    fn compaction_unknown_type_is_rejected() {
        let err = decode::<ManualCompactionCommand>(
            r#"{"app_name":"t1","type":"daily","target_level":0,"bottommost_level_compaction":"skip"}"#,
        )
        .unwrap_err();
        assert!(malformed_message(err).contains("daily"));
    }

    #[test]
    fn compaction_unknown_bottommost_policy_is_rejected() {
        let err = decode::<ManualCompactionCommand>(
            r#"{"app_name":"t1","type":"once","target_level":0,"bottommost_level_compaction":"always"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Malformed(_)));
    }

    #[test]
    fn compaction_string_target_level_is_type_error() {
        let err = decode::<ManualCompactionCommand>(
            r#"{"app_name":"t1","type":"once","target_level":"1","bottommost_level_compaction":"skip"}"#,
        )
        .unwrap_err();
        assert!(malformed_message(err).contains("invalid type"));
    }

    #[test]
    fn compaction_target_level_bounds() {
        let limits = CommandLimits { num_levels: 6 };
        let mut cmd = ManualCompactionCommand {
            app_name: "t1".into(),
            compaction_type: CompactionType::Once,
            target_level: 6,
            bottommost_level_policy: BottommostLevelPolicy::Skip,
            max_concurrent_running_count: 0,
            trigger_time: String::new(),
        };
        assert!(cmd.validate(&limits).is_ok());

        cmd.target_level = 7;
        assert_eq!(
            cmd.validate(&limits),
            Err(CommandError::TargetLevelOutOfRange {
                target_level: 7,
                num_levels: 6
            })
        );

        cmd.target_level = -2;
        assert!(cmd.validate(&limits).is_err());
    }

    #[test]
    fn once_compaction_envs_use_now() {
        let cmd = ManualCompactionCommand {
            app_name: "t1".into(),
            compaction_type: CompactionType::Once,
            target_level: -1,
            bottommost_level_policy: BottommostLevelPolicy::Force,
            max_concurrent_running_count: 0,
            trigger_time: String::new(),
        };
        let envs = cmd.to_app_envs(1_700_000_000);
        assert_eq!(
            envs[env_keys::MANUAL_COMPACT_ONCE_TRIGGER_TIME],
            "1700000000"
        );
        assert_eq!(envs[env_keys::MANUAL_COMPACT_ONCE_TARGET_LEVEL], "-1");
        assert_eq!(
            envs[env_keys::MANUAL_COMPACT_ONCE_BOTTOMMOST_LEVEL_COMPACTION],
            "force"
        );
        assert_eq!(envs[env_keys::MANUAL_COMPACT_DISABLED], "false");
        assert!(!envs.contains_key(env_keys::MANUAL_COMPACT_MAX_CONCURRENT_RUNNING_COUNT));
    }

    #[test]
    fn periodic_compaction_envs_keep_trigger_time_and_limit() {
        let cmd = ManualCompactionCommand {
            app_name: "t1".into(),
            compaction_type: CompactionType::Periodic,
            target_level: 3,
            bottommost_level_policy: BottommostLevelPolicy::Skip,
            max_concurrent_running_count: 4,
            trigger_time: "3:00,21:00".into(),
        };
        let envs = cmd.to_app_envs(0);
        assert_eq!(
            envs[env_keys::MANUAL_COMPACT_PERIODIC_TRIGGER_TIME],
            "3:00,21:00"
        );
        assert_eq!(envs[env_keys::MANUAL_COMPACT_PERIODIC_TARGET_LEVEL], "3");
        assert_eq!(
            envs[env_keys::MANUAL_COMPACT_MAX_CONCURRENT_RUNNING_COUNT],
            "4"
        );
        assert!(!envs.contains_key(env_keys::MANUAL_COMPACT_ONCE_TRIGGER_TIME));
    }

    // ---- UsageScenarioCommand ----

    #[test]
    fn scenario_decodes_bulk_load() {
        let cmd: UsageScenarioCommand =
            decode(r#"{"app_name":"t1","scenario":"bulk_load"}"#).unwrap();
        assert_eq!(cmd.scenario, UsageScenario::BulkLoad);
        assert_eq!(
            cmd.scenario.to_app_envs()[env_keys::ROCKSDB_USAGE_SCENARIO],
            "bulk_load"
        );
    }

    #[test]
    fn scenario_unknown_value_is_rejected() {
        let err = decode::<UsageScenarioCommand>(r#"{"app_name":"t1","scenario":"unknown"}"#)
            .unwrap_err();
        assert!(malformed_message(err).contains("unknown"));
    }

    // ---- Properties ----

    fn bottommost() -> impl Strategy<Value = BottommostLevelPolicy> {
        prop_oneof![
            Just(BottommostLevelPolicy::Skip),
            Just(BottommostLevelPolicy::Force)
        ]
    }

    proptest! {
        #[test]
        fn periodic_without_trigger_time_always_rejected(
            app_name in ".*",
            target_level in any::<i32>(),
            policy in bottommost(),
            concurrency in any::<u32>(),
            blank in "[ \t]{0,3}",
        ) {
            let cmd = ManualCompactionCommand {
                app_name,
                compaction_type: CompactionType::Periodic,
                target_level,
                bottommost_level_policy: policy,
                max_concurrent_running_count: concurrency,
                trigger_time: blank,
            };
            prop_assert_eq!(
                cmd.validate(&CommandLimits::default()),
                Err(CommandError::MissingTriggerTime)
            );
        }

        #[test]
        fn periodic_with_trigger_time_accepted(
            app_name in "[a-z][a-z0-9_]{0,15}",
            target_level in -1i32..=7,
            policy in bottommost(),
            concurrency in any::<u32>(),
            trigger_time in "[0-9]{1,2}:[0-9]{2}(,[0-9]{1,2}:[0-9]{2}){0,2}",
        ) {
            let cmd = ManualCompactionCommand {
                app_name,
                compaction_type: CompactionType::Periodic,
                target_level,
                bottommost_level_policy: policy,
                max_concurrent_running_count: concurrency,
                trigger_time,
            };
            prop_assert!(cmd.validate(&CommandLimits::default()).is_ok());
        }
    }
}
