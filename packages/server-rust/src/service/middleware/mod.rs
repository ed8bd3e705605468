//! Tower middleware between the transport and the operation table.
//!
//! - [`metrics`]: request timing and counting via `tracing` spans and `metrics`
//! - [`pipeline`]: composes the layers into the [`Dispatcher`]

pub mod metrics;
pub mod pipeline;

pub use metrics::MetricsLayer;
pub use pipeline::{build_dispatch_pipeline, Dispatcher};
