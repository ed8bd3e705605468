use meta_admin_core::ClusterInfo;
use serde::Serialize;

use super::HandlerContext;
use crate::service::operation::AdminError;
use crate::service::request::HttpRequest;
use crate::service::response::HttpResponse;

#[derive(Debug, Serialize)]
struct ClusterView {
    #[serde(flatten)]
    cluster: ClusterInfo,
    /// Whether the answering node is the primary.
    is_primary: bool,
}

/// `GET /meta/cluster`
///
/// Answered by any meta server, primary or not; callers use it to find the
/// primary in the first place.
pub async fn get_cluster_info(
    ctx: HandlerContext,
    _req: HttpRequest,
) -> Result<HttpResponse, AdminError> {
    let is_primary = ctx.meta.is_current_leader();
    let cluster = ctx.meta.get_cluster_info().await?;
    Ok(HttpResponse::ok(&ClusterView {
        cluster,
        is_primary,
    }))
}
