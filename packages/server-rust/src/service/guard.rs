//! Leadership guard: proceed on the primary, redirect everywhere else.

use std::sync::Arc;

use http::uri::Scheme;
use tracing::warn;

use super::config::ReadPolicy;
use super::operation::AdminError;
use super::request::HttpRequest;
use super::response::HttpResponse;
use crate::traits::MetaService;

/// Decides whether a request may run on this node.
///
/// Leadership is read from the metadata service on every call and never
/// cached: the primary can change between two requests.
#[derive(Clone)]
pub struct LeadershipGuard {
    meta: Arc<dyn MetaService>,
    read_policy: ReadPolicy,
    redirect_scheme: Scheme,
}

impl LeadershipGuard {
    #[must_use]
    pub fn new(
        meta: Arc<dyn MetaService>,
        read_policy: ReadPolicy,
        redirect_scheme: Scheme,
    ) -> Self {
        Self {
            meta,
            read_policy,
            redirect_scheme,
        }
    }

    /// Returns `None` on the primary, otherwise the response to send instead:
    /// a redirect to the known primary, or 503 when no primary is known.
    #[must_use]
    pub fn check_or_redirect(&self, req: &HttpRequest) -> Option<HttpResponse> {
        let leadership = self.meta.leadership();
        if leadership.is_leader {
            return None;
        }
        match leadership.leader_address.filter(|addr| !addr.is_empty()) {
            Some(leader) => {
                warn!(path = req.path(), leader = %leader, "not primary, redirecting");
                Some(HttpResponse::redirect(&self.redirect_scheme, &leader, req))
            }
            None => {
                warn!(path = req.path(), "not primary and primary unknown");
                Some(HttpResponse::error(&AdminError::LeaderUnknown))
            }
        }
    }

    /// Guard for read-only handlers: applies `check_or_redirect` unless the
    /// read policy allows serving from any replica.
    #[must_use]
    pub fn check_read(&self, req: &HttpRequest) -> Option<HttpResponse> {
        match self.read_policy {
            ReadPolicy::LeaderOnly => self.check_or_redirect(req),
            ReadPolicy::AnyReplica => None,
        }
    }
}
