//! Bulk load: admission on the primary, progress polling anywhere the read
//! policy allows.

use meta_admin_core::{decode_command, BulkLoadStartCommand, BulkLoadStatus};
use serde::Serialize;
use tracing::info;

use super::HandlerContext;
use crate::service::operation::AdminError;
use crate::service::request::HttpRequest;
use crate::service::response::HttpResponse;

#[derive(Debug, Serialize)]
struct BulkLoadView {
    #[serde(flatten)]
    status: BulkLoadStatus,
    /// Aggregate progress in percent.
    progress: u32,
}

/// `POST /meta/app/start_bulk_load`
pub async fn start_bulk_load(
    ctx: HandlerContext,
    req: HttpRequest,
) -> Result<HttpResponse, AdminError> {
    if let Some(redirect) = ctx.guard.check_or_redirect(&req) {
        return Ok(redirect);
    }
    let command: BulkLoadStartCommand =
        decode_command(req.body(), &ctx.config.command_limits())?;
    let app_name = command.app_name.clone();

    ctx.meta.start_bulk_load(command).await?;
    info!(app = %app_name, "bulk load started");
    Ok(HttpResponse::ack(format!("start bulk load for app {app_name} succeed")))
}

/// `GET /meta/app/query_bulk_load?name=<app_name>`
pub async fn query_bulk_load(
    ctx: HandlerContext,
    req: HttpRequest,
) -> Result<HttpResponse, AdminError> {
    if let Some(redirect) = ctx.guard.check_read(&req) {
        return Ok(redirect);
    }
    let app_name = req.query().require("name")?;

    let status = ctx.meta.get_bulk_load_status(app_name).await?;
    let progress = status.progress();
    Ok(HttpResponse::ok(&BulkLoadView { status, progress }))
}
