use meta_admin_core::{decode_command, UsageScenarioCommand};
use tracing::info;

use super::HandlerContext;
use crate::service::operation::AdminError;
use crate::service::request::HttpRequest;
use crate::service::response::HttpResponse;

/// `POST /meta/app/usage_scenario`
pub async fn update_scenario(
    ctx: HandlerContext,
    req: HttpRequest,
) -> Result<HttpResponse, AdminError> {
    if let Some(redirect) = ctx.guard.check_or_redirect(&req) {
        return Ok(redirect);
    }
    let command: UsageScenarioCommand = decode_command(req.body(), &ctx.config.command_limits())?;

    ctx.meta
        .set_usage_scenario(&command.app_name, command.scenario)
        .await?;
    info!(app = %command.app_name, scenario = %command.scenario, "usage scenario updated");
    Ok(HttpResponse::ack(format!(
        "update usage scenario of app {} to {} succeed",
        command.app_name, command.scenario
    )))
}
