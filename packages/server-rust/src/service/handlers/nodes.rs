use std::collections::BTreeMap;

use meta_admin_core::{NodeStatus, PartitionConfiguration};
use serde::Serialize;

use super::HandlerContext;
use crate::service::operation::AdminError;
use crate::service::request::HttpRequest;
use crate::service::response::HttpResponse;

/// Replicas one node hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplicaCounts {
    pub primary_count: u32,
    pub secondary_count: u32,
    pub replica_count: u32,
}

/// Counts primaries and secondaries per node address.
pub(crate) fn replica_distribution<'a>(
    partitions: impl IntoIterator<Item = &'a PartitionConfiguration>,
) -> BTreeMap<String, ReplicaCounts> {
    let mut by_node: BTreeMap<String, ReplicaCounts> = BTreeMap::new();
    for partition in partitions {
        if let Some(primary) = &partition.primary {
            let counts = by_node.entry(primary.clone()).or_default();
            counts.primary_count += 1;
            counts.replica_count += 1;
        }
        for secondary in &partition.secondaries {
            let counts = by_node.entry(secondary.clone()).or_default();
            counts.secondary_count += 1;
            counts.replica_count += 1;
        }
    }
    by_node
}

#[derive(Debug, Serialize)]
struct NodeView {
    address: String,
    status: NodeStatus,
    #[serde(flatten)]
    replicas: Option<ReplicaCounts>,
}

#[derive(Debug, Default, Serialize)]
struct NodeSummary {
    alive_node_count: u32,
    unalive_node_count: u32,
}

#[derive(Debug, Serialize)]
struct NodesView {
    nodes: Vec<NodeView>,
    summary: NodeSummary,
}

/// `GET /meta/nodes[?detail]`
pub async fn list_node(ctx: HandlerContext, req: HttpRequest) -> Result<HttpResponse, AdminError> {
    if let Some(redirect) = ctx.guard.check_read(&req) {
        return Ok(redirect);
    }
    let detail = req.query().has_flag("detail");

    let nodes = ctx.meta.list_nodes().await?;
    let distribution = if detail {
        let apps = ctx.meta.list_apps().await?;
        Some(replica_distribution(apps.iter().flat_map(|app| &app.partitions)))
    } else {
        None
    };

    let mut summary = NodeSummary::default();
    let nodes = nodes
        .into_iter()
        .map(|node| {
            match node.status {
                NodeStatus::Alive => summary.alive_node_count += 1,
                NodeStatus::Unalive => summary.unalive_node_count += 1,
            }
            let replicas = distribution
                .as_ref()
                .map(|d| d.get(&node.address).copied().unwrap_or_default());
            NodeView {
                address: node.address,
                status: node.status,
                replicas,
            }
        })
        .collect();

    Ok(HttpResponse::ok(&NodesView { nodes, summary }))
}
