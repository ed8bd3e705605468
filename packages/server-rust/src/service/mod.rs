//! Admin operation framework.
//!
//! 1. **Requests** (`request`): method, path, decoded query, raw body
//! 2. **Registry** (`registry`): path -> handler table built at startup
//! 3. **Guard** (`guard`): proceed on the primary, redirect elsewhere
//! 4. **Handlers** (`handlers`): the eleven admin operations
//! 5. **Middleware** (`middleware`): Tower layers around the dispatcher
//! 6. **Responses** (`response`): JSON bodies with an error envelope

pub mod config;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod operation;
pub mod registry;
pub mod request;
pub mod response;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ReadPolicy, ServerConfig};
pub use guard::LeadershipGuard;
pub use middleware::{build_dispatch_pipeline, Dispatcher};
pub use operation::{error_codes, AdminError, MetaError};
pub use registry::{OperationDescriptor, OperationRegistry};
pub use request::{HttpRequest, QueryParams};
pub use response::HttpResponse;
pub use router::MetaHttpService;
