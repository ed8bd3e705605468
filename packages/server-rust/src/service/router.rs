//! The meta admin service: the eleven registered operations behind one
//! `tower::Service<HttpRequest>`.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::Method;
use tower::Service;

use super::config::ServerConfig;
use super::handlers::{
    app, backup_policy, bind, bulk_load, cluster, compaction, duplication, nodes, usage_scenario,
    HandlerContext,
};
use super::registry::{HandlerFuture, OperationRegistry};
use super::request::HttpRequest;
use super::response::HttpResponse;
use crate::traits::MetaService;

// ---------------------------------------------------------------------------
// MetaHttpService
// ---------------------------------------------------------------------------

/// Admin HTTP surface of the metadata service.
///
/// Cloning is cheap: the registry is built once and shared read-only.
#[derive(Clone)]
pub struct MetaHttpService {
    registry: Arc<OperationRegistry>,
}

impl MetaHttpService {
    /// Builds the operation table over `meta`.
    #[must_use]
    pub fn new(meta: Arc<dyn MetaService>, config: Arc<ServerConfig>) -> Self {
        let mut registry = OperationRegistry::new(&config.service_root);
        let ctx = HandlerContext::new(meta, config);

        registry.register(
            "app",
            Method::GET,
            bind(&ctx, app::get_app),
            "name=<app_name>[&detail]",
            "Query app info.",
        );
        registry.register(
            "app/duplication",
            Method::GET,
            bind(&ctx, duplication::query_duplication),
            "name=<app_name>",
            "Query app duplication info.",
        );
        registry.register(
            "apps",
            Method::GET,
            bind(&ctx, app::list_app),
            "[detail]",
            "List all apps in the cluster.",
        );
        registry.register(
            "nodes",
            Method::GET,
            bind(&ctx, nodes::list_node),
            "[detail]",
            "Query the replica servers info.",
        );
        registry.register(
            "cluster",
            Method::GET,
            bind(&ctx, cluster::get_cluster_info),
            "",
            "Query the cluster info.",
        );
        registry.register(
            "app_envs",
            Method::GET,
            bind(&ctx, app::get_app_envs),
            "name=<app_name>",
            "Query app environments.",
        );
        registry.register(
            "backup_policy",
            Method::GET,
            bind(&ctx, backup_policy::query_backup_policy),
            "name=<app_name1>&name=<app_name2>",
            "Query backup policy by policy names.",
        );
        registry.register(
            "app/start_bulk_load",
            Method::POST,
            bind(&ctx, bulk_load::start_bulk_load),
            "A JSON format of start_bulk_load_request structure",
            "Start bulk load on an app.",
        );
        registry.register(
            "app/query_bulk_load",
            Method::GET,
            bind(&ctx, bulk_load::query_bulk_load),
            "name=<app_name>",
            "Query app bulk load info.",
        );
        registry.register(
            "app/start_compaction",
            Method::POST,
            bind(&ctx, compaction::start_compaction),
            "A JSON format of manual_compaction_info structure",
            "Start compaction for an app.",
        );
        registry.register(
            "app/usage_scenario",
            Method::POST,
            bind(&ctx, usage_scenario::update_scenario),
            "A JSON format of usage_scenario_info structure",
            "Update usage scenario of an app.",
        );

        Self {
            registry: Arc::new(registry),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Dispatches one request through the operation table.
    pub fn dispatch(&self, req: HttpRequest) -> HandlerFuture {
        self.registry.dispatch(req)
    }
}

impl Service<HttpRequest> for MetaHttpService {
    type Response = HttpResponse;
    type Error = Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<HttpResponse, Infallible>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        let fut = self.registry.dispatch(req);
        Box::pin(async move { Ok(fut.await) })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use proptest::prelude::*;
    use tower::ServiceExt;

    use super::*;
    use crate::meta::InMemoryMetaService;
    use crate::service::operation::error_codes;
    use crate::service::test_support::{leader_meta, recording_service, sample_fixture};

    #[test]
    fn registers_every_operation_once_in_order() {
        let (service, _) = recording_service(leader_meta());
        let paths: Vec<&str> = service
            .registry()
            .descriptors()
            .iter()
            .map(|d| d.path)
            .collect();
        assert_eq!(
            paths,
            [
                "app",
                "app/duplication",
                "apps",
                "nodes",
                "cluster",
                "app_envs",
                "backup_policy",
                "app/start_bulk_load",
                "app/query_bulk_load",
                "app/start_compaction",
                "app/usage_scenario",
            ]
        );
        let posts: Vec<&str> = service
            .registry()
            .descriptors()
            .iter()
            .filter(|d| d.method == Method::POST)
            .map(|d| d.path)
            .collect();
        assert_eq!(
            posts,
            ["app/start_bulk_load", "app/start_compaction", "app/usage_scenario"]
        );
    }

    #[tokio::test]
    async fn serves_through_tower_service() {
        let (service, recording) = recording_service(leader_meta());
        let resp = service
            .oneshot(HttpRequest::get("/meta/apps").unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(recording.calls(), ["list_apps"]);
    }

    #[tokio::test]
    async fn unknown_path_touches_nothing() {
        let (service, recording) = recording_service(leader_meta());
        let resp = service
            .oneshot(HttpRequest::get("/meta/app/stop_bulk_load").unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.body()["operations"].as_array().map(Vec::len),
            Some(11)
        );
        assert!(recording.calls().is_empty());
    }

    #[tokio::test]
    async fn custom_service_root() {
        let config = ServerConfig {
            service_root: "admin".to_string(),
            ..ServerConfig::default()
        };
        let (service, _) =
            crate::service::test_support::recording_service_with(leader_meta(), config);
        let resp = service.dispatch(HttpRequest::get("/admin/cluster").unwrap()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = service.dispatch(HttpRequest::get("/meta/cluster").unwrap()).await;
        assert_eq!(resp.error_code(), Some(error_codes::HANDLER_NOT_FOUND));
    }

    fn mutating_request() -> impl Strategy<Value = HttpRequest> {
        prop_oneof![
            Just(
                HttpRequest::post(
                    "/meta/app/start_bulk_load",
                    r#"{"app_name":"t1","cluster_name":"c","file_provider_type":"local_service","remote_root_path":"/r"}"#,
                )
                .unwrap()
            ),
            Just(
                HttpRequest::post(
                    "/meta/app/start_compaction",
                    r#"{"app_name":"t1","type":"once","target_level":-1,"bottommost_level_compaction":"skip"}"#,
                )
                .unwrap()
            ),
            Just(
                HttpRequest::post(
                    "/meta/app/usage_scenario",
                    r#"{"app_name":"t1","scenario":"bulk_load"}"#,
                )
                .unwrap()
            ),
            Just(HttpRequest::get("/meta/apps?detail").unwrap()),
            Just(HttpRequest::get("/meta/nodes").unwrap()),
            Just(HttpRequest::get("/meta/backup_policy?name=daily").unwrap()),
        ]
    }

    proptest! {
        #[test]
        fn follower_redirects_without_side_effects(
            req in mutating_request(),
            host in "[a-z]{1,8}",
            port in 1024u16..65535,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let meta = std::sync::Arc::new(InMemoryMetaService::from_fixture(
                "meta-1:34601",
                sample_fixture(),
            ));
            let leader = format!("{host}:{port}");
            meta.follow(leader.clone());
            let (service, recording) = recording_service(meta);

            let path = req.path().to_string();
            let query = req.raw_query().map(str::to_string);
            let resp = rt.block_on(service.dispatch(req));

            prop_assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
            let mut expected = format!("http://{leader}{path}");
            if let Some(query) = query {
                expected.push('?');
                expected.push_str(&query);
            }
            prop_assert_eq!(resp.location(), Some(expected.as_str()));
            prop_assert_eq!(resp.body()["primary_meta_server"].as_str(), Some(leader.as_str()));
            prop_assert!(recording.calls().is_empty());
        }
    }
}
