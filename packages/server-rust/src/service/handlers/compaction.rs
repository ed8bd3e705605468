use meta_admin_core::{decode_command, ManualCompactionCommand};
use tracing::info;

use super::HandlerContext;
use crate::service::operation::AdminError;
use crate::service::request::HttpRequest;
use crate::service::response::HttpResponse;

/// `POST /meta/app/start_compaction`
pub async fn start_compaction(
    ctx: HandlerContext,
    req: HttpRequest,
) -> Result<HttpResponse, AdminError> {
    if let Some(redirect) = ctx.guard.check_or_redirect(&req) {
        return Ok(redirect);
    }
    let command: ManualCompactionCommand =
        decode_command(req.body(), &ctx.config.command_limits())?;
    let app_name = command.app_name.clone();
    let compaction_type = command.compaction_type;

    ctx.meta.start_manual_compaction(command).await?;
    info!(app = %app_name, compaction_type = %compaction_type, "manual compaction scheduled");
    Ok(HttpResponse::ack(format!(
        "start {compaction_type} compaction for app {app_name} succeed"
    )))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use meta_admin_core::env_keys;
    use proptest::prelude::*;

    use super::*;
    use crate::service::operation::error_codes;
    use crate::service::test_support::{leader_meta, recording_service};
    use crate::traits::MetaService;

    fn post(body: &str) -> HttpRequest {
        HttpRequest::post("/meta/app/start_compaction", body.to_string()).unwrap()
    }

    #[tokio::test]
    async fn periodic_compaction_writes_envs() {
        let meta = leader_meta();
        let (service, recording) = recording_service(meta.clone());
        let resp = service
            .dispatch(post(
                r#"{"app_name":"t1","type":"periodic","target_level":2,"bottommost_level_compaction":"force","max_concurrent_running_count":0,"trigger_time":"3:00,21:00"}"#,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK, "{:?}", resp.body());
        assert_eq!(recording.calls(), ["start_manual_compaction"]);

        let envs = meta.get_app_envs("t1").await.unwrap();
        assert_eq!(envs[env_keys::MANUAL_COMPACT_PERIODIC_TRIGGER_TIME], "3:00,21:00");
        assert_eq!(envs[env_keys::MANUAL_COMPACT_PERIODIC_TARGET_LEVEL], "2");
        assert_eq!(
            envs[env_keys::MANUAL_COMPACT_PERIODIC_BOTTOMMOST_LEVEL_COMPACTION],
            "force"
        );
        assert_eq!(envs[env_keys::MANUAL_COMPACT_DISABLED], "false");
        assert!(!envs.contains_key(env_keys::MANUAL_COMPACT_MAX_CONCURRENT_RUNNING_COUNT));
    }

    #[tokio::test]
    async fn alias_field_names_are_accepted() {
        let (service, _) = recording_service(leader_meta());
        let resp = service
            .dispatch(post(
                r#"{"app_name":"t2","compaction_type":"once","target_level":-1,"bottommost_level_policy":"skip"}"#,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::OK, "{:?}", resp.body());
    }

    #[tokio::test]
    async fn unknown_compaction_type_is_rejected() {
        let (service, recording) = recording_service(leader_meta());
        let resp = service
            .dispatch(post(
                r#"{"app_name":"t1","type":"hourly","target_level":1,"bottommost_level_compaction":"skip"}"#,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.error_code(), Some(error_codes::INVALID_PARAMETERS));
        assert!(recording.calls().is_empty());
    }

    #[tokio::test]
    async fn target_level_out_of_range_is_rejected() {
        let (service, recording) = recording_service(leader_meta());
        let resp = service
            .dispatch(post(
                r#"{"app_name":"t1","type":"once","target_level":8,"bottommost_level_compaction":"skip"}"#,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.body()["error"]["message"],
            "target_level should be in [-1, 7], got 8"
        );
        assert!(recording.calls().is_empty());
    }

    #[tokio::test]
    async fn once_with_trigger_time_is_rejected() {
        let meta = leader_meta();
        let (service, recording) = recording_service(meta.clone());
        let resp = service
            .dispatch(post(
                r#"{"app_name":"t1","type":"once","target_level":-1,"bottommost_level_compaction":"skip","trigger_time":"3:00"}"#,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.error_code(), Some(error_codes::INVALID_PARAMETERS));
        assert_eq!(
            resp.body()["error"]["message"],
            "trigger_time should be empty when type is once"
        );
        assert!(recording.calls().is_empty());

        let envs = meta.get_app_envs("t1").await.unwrap();
        assert!(!envs.contains_key(env_keys::MANUAL_COMPACT_ONCE_TRIGGER_TIME));
    }

    #[tokio::test]
    async fn unknown_app_is_not_found() {
        let (service, _) = recording_service(leader_meta());
        let resp = service
            .dispatch(post(
                r#"{"app_name":"t9","type":"once","target_level":1,"bottommost_level_compaction":"skip"}"#,
            ))
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.error_code(), Some(error_codes::APP_NOT_EXIST));
    }

    proptest! {
        #[test]
        fn periodic_without_trigger_time_never_reaches_meta(
            target_level in -1i32..=7,
            max_running in 0u32..16,
            bottommost in prop_oneof![Just("skip"), Just("force")],
            blank in prop_oneof![Just(""), Just(" "), Just("\t")],
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (service, recording) = recording_service(leader_meta());
            let body = serde_json::json!({
                "app_name": "t1",
                "type": "periodic",
                "target_level": target_level,
                "bottommost_level_compaction": bottommost,
                "max_concurrent_running_count": max_running,
                "trigger_time": blank,
            })
            .to_string();

            let resp = rt.block_on(service.dispatch(post(&body)));
            prop_assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            prop_assert_eq!(
                resp.body()["error"]["message"].as_str(),
                Some("trigger_time should not be empty when type is periodic")
            );
            prop_assert!(recording.calls().is_empty());
        }

        #[test]
        fn zero_running_count_means_unlimited(target_level in -1i32..=7) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (service, recording) = recording_service(leader_meta());
            let body = serde_json::json!({
                "app_name": "t1",
                "type": "once",
                "target_level": target_level,
                "bottommost_level_compaction": "skip",
                "max_concurrent_running_count": 0,
            })
            .to_string();

            let resp = rt.block_on(service.dispatch(post(&body)));
            prop_assert_eq!(resp.status(), StatusCode::OK);
            prop_assert_eq!(recording.calls(), vec!["start_manual_compaction"]);
        }
    }
}
