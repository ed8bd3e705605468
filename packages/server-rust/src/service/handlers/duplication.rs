use super::HandlerContext;
use crate::service::operation::AdminError;
use crate::service::request::HttpRequest;
use crate::service::response::HttpResponse;

/// `GET /meta/app/duplication?name=<app_name>`
pub async fn query_duplication(
    ctx: HandlerContext,
    req: HttpRequest,
) -> Result<HttpResponse, AdminError> {
    if let Some(redirect) = ctx.guard.check_read(&req) {
        return Ok(redirect);
    }
    let app_name = req.query().require("name")?;

    let status = ctx.meta.get_duplication_status(app_name).await?;
    Ok(HttpResponse::ok(&status))
}
