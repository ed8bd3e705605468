use meta_admin_core::BackupPolicyStatus;
use serde::Serialize;

use super::HandlerContext;
use crate::service::operation::{AdminError, MetaError};
use crate::service::request::HttpRequest;
use crate::service::response::HttpResponse;

#[derive(Debug, Serialize)]
struct BackupPoliciesView {
    policies: Vec<BackupPolicyStatus>,
}

/// `GET /meta/backup_policy[?name=<p1>&name=<p2>...]`
///
/// Results follow the order of the `name` parameters, repeats included.
/// Without any `name`, every policy is returned.
pub async fn query_backup_policy(
    ctx: HandlerContext,
    req: HttpRequest,
) -> Result<HttpResponse, AdminError> {
    if let Some(redirect) = ctx.guard.check_read(&req) {
        return Ok(redirect);
    }
    let names: Vec<String> = req
        .query()
        .get_all("name")
        .into_iter()
        .map(str::to_string)
        .collect();
    if names.iter().any(String::is_empty) {
        return Err(AdminError::InvalidQuery("name should not be empty".to_string()));
    }

    let found = ctx.meta.get_backup_policy_status(&names).await?;
    if names.is_empty() {
        return Ok(HttpResponse::ok(&BackupPoliciesView { policies: found }));
    }

    let policies = names
        .into_iter()
        .map(|name| {
            found
                .iter()
                .find(|policy| policy.policy_name == name)
                .cloned()
                .ok_or(MetaError::PolicyNotFound(name))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(HttpResponse::ok(&BackupPoliciesView { policies }))
}
