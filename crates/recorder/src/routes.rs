//! Per-kind route handlers
//!
//! A registered kind may carry a documentation route and a custom route for
//! kind-specific endpoints. The registry stores and hands out these handlers
//! but never calls them itself.

use std::sync::Arc;

/// Prefix under which built-in kind documentation is served
pub const DOC_ROUTE_PREFIX: &str = "/doc/builtin";

/// Request routed to a kind's handler
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    /// HTTP-style verb
    pub verb: String,
    /// Resource path relative to the kind's route
    pub resource: String,
    /// Request payload
    pub body: serde_json::Value,
}

impl RouteRequest {
    /// GET request for `resource` with no body
    pub fn get(resource: impl Into<String>) -> Self {
        RouteRequest {
            verb: "GET".to_string(),
            resource: resource.into(),
            body: serde_json::Value::Null,
        }
    }
}

/// Outcome of a route handler
#[derive(Debug, Clone, PartialEq)]
pub enum RouteResponse {
    /// Redirect to another resource
    Redirect(String),
    /// JSON payload
    Json(serde_json::Value),
    /// The handler does not serve this request
    NotHandled,
}

/// Opaque handler reference stored with a kind
pub type TypeRouteHandler = Arc<dyn Fn(&RouteRequest) -> RouteResponse + Send + Sync>;

/// Handler redirecting every request to the kind's documentation page
///
/// Returns `None` for an empty `doc_route`.
pub fn internal_doc_redirect(package: &str, doc_route: &str) -> Option<TypeRouteHandler> {
    if doc_route.is_empty() {
        return None;
    }
    let target = format!(
        "{}/{}/{}",
        DOC_ROUTE_PREFIX,
        package,
        doc_route.trim_start_matches('/')
    );
    Some(Arc::new(move |_req: &RouteRequest| {
        RouteResponse::Redirect(target.clone())
    }))
}
