//! App queries: `app`, `apps` and `app_envs`.

use std::collections::BTreeMap;

use meta_admin_core::{AppInfo, AppSnapshot, AppStatus, HealthSummary, PartitionConfiguration};
use serde::Serialize;

use super::nodes::{replica_distribution, ReplicaCounts};
use super::HandlerContext;
use crate::service::operation::AdminError;
use crate::service::request::HttpRequest;
use crate::service::response::HttpResponse;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// General app fields, without envs.
#[derive(Debug, Serialize)]
struct AppGeneral<'a> {
    app_id: i32,
    app_name: &'a str,
    app_type: &'a str,
    status: AppStatus,
    partition_count: u32,
    max_replica_count: u32,
    is_stateful: bool,
    create_second: u64,
}

impl<'a> From<&'a AppInfo> for AppGeneral<'a> {
    fn from(info: &'a AppInfo) -> Self {
        Self {
            app_id: info.app_id,
            app_name: &info.app_name,
            app_type: &info.app_type,
            status: info.status,
            partition_count: info.partition_count,
            max_replica_count: info.max_replica_count,
            is_stateful: info.is_stateful,
            create_second: info.create_second,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReplicaView<'a> {
    partition_index: u32,
    ballot: i64,
    replica_count: u32,
    primary: Option<&'a str>,
    secondaries: &'a [String],
}

impl<'a> From<&'a PartitionConfiguration> for ReplicaView<'a> {
    fn from(partition: &'a PartitionConfiguration) -> Self {
        Self {
            partition_index: partition.partition_index,
            ballot: partition.ballot,
            replica_count: partition.replica_count(),
            primary: partition.primary.as_deref(),
            secondaries: &partition.secondaries,
        }
    }
}

#[derive(Debug, Serialize)]
struct NodeReplicasView {
    address: String,
    #[serde(flatten)]
    counts: ReplicaCounts,
}

#[derive(Debug, Serialize)]
struct AppView<'a> {
    general: AppGeneral<'a>,
    healthy: HealthSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    replicas: Option<Vec<ReplicaView<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nodes: Option<Vec<NodeReplicasView>>,
}

impl<'a> AppView<'a> {
    fn new(snapshot: &'a AppSnapshot, detail: bool) -> Self {
        let (replicas, nodes) = if detail {
            let replicas = snapshot.partitions.iter().map(ReplicaView::from).collect();
            let nodes = replica_distribution(&snapshot.partitions)
                .into_iter()
                .map(|(address, counts)| NodeReplicasView { address, counts })
                .collect();
            (Some(replicas), Some(nodes))
        } else {
            (None, None)
        };
        Self {
            general: AppGeneral::from(&snapshot.info),
            healthy: HealthSummary::from_partitions(&snapshot.partitions),
            replicas,
            nodes,
        }
    }
}

#[derive(Debug, Serialize)]
struct AppEntry<'a> {
    #[serde(flatten)]
    general: AppGeneral<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    healthy: Option<HealthSummary>,
}

#[derive(Debug, Serialize)]
struct AppsView<'a> {
    apps: Vec<AppEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct AppEnvsView<'a> {
    app_name: &'a str,
    envs: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /meta/app?name=<app_name>[&detail]`
pub async fn get_app(ctx: HandlerContext, req: HttpRequest) -> Result<HttpResponse, AdminError> {
    if let Some(redirect) = ctx.guard.check_read(&req) {
        return Ok(redirect);
    }
    let app_name = req.query().require("name")?;
    let detail = req.query().has_flag("detail");

    let snapshot = ctx.meta.get_app_info(app_name).await?;
    Ok(HttpResponse::ok(&AppView::new(&snapshot, detail)))
}

/// `GET /meta/apps[?detail]`
pub async fn list_app(ctx: HandlerContext, req: HttpRequest) -> Result<HttpResponse, AdminError> {
    if let Some(redirect) = ctx.guard.check_read(&req) {
        return Ok(redirect);
    }
    let detail = req.query().has_flag("detail");

    let apps = ctx.meta.list_apps().await?;
    let view = AppsView {
        apps: apps
            .iter()
            .map(|app| AppEntry {
                general: AppGeneral::from(&app.info),
                healthy: detail.then(|| HealthSummary::from_partitions(&app.partitions)),
            })
            .collect(),
    };
    Ok(HttpResponse::ok(&view))
}

/// `GET /meta/app_envs?name=<app_name>`
pub async fn get_app_envs(
    ctx: HandlerContext,
    req: HttpRequest,
) -> Result<HttpResponse, AdminError> {
    if let Some(redirect) = ctx.guard.check_read(&req) {
        return Ok(redirect);
    }
    let app_name = req.query().require("name")?;

    let envs = ctx.meta.get_app_envs(app_name).await?;
    Ok(HttpResponse::ok(&AppEnvsView { app_name, envs }))
}
