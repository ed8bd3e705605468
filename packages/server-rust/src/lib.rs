//! Meta admin server: leader-aware HTTP control plane for a sharded metadata
//! service.

pub mod meta;
pub mod network;
pub mod service;
pub mod traits;

pub use meta::InMemoryMetaService;
pub use network::{NetworkConfig, NetworkModule};
pub use service::{MetaHttpService, ServerConfig};
pub use traits::{Leadership, MetaService};
