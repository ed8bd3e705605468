//! Pipeline composition: wraps the admin service with its middleware layers.

use tower::ServiceBuilder;

use super::metrics::{MetricsLayer, MetricsService};
use crate::service::router::MetaHttpService;

/// The admin service as seen by the transport.
pub type Dispatcher = MetricsService<MetaHttpService>;

/// Wraps `service` with the dispatch middleware.
///
/// Timeouts and body limits belong to the transport; only metrics sit
/// between the transport and the operation table.
#[must_use]
pub fn build_dispatch_pipeline(service: MetaHttpService) -> Dispatcher {
    ServiceBuilder::new().layer(MetricsLayer).service(service)
}
