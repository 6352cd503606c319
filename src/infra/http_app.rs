use std::sync::Arc;

use axum::{
    routing::{any_service, get, post},
    Router,
};

use crate::agent::Agent;
use crate::infra::mcp;
use crate::infra::runtime::mcp_transport::{make_streamable_http_service, LocalSessionManager};

/// `/healthz`, `/v1/answer`, `/rpc` and Streamable MCP at `/mcp`, all over one shared agent.
pub fn build_app(agent: Agent) -> Router {
    let session_mgr = Arc::new(LocalSessionManager::default());
    let mcp_service = make_streamable_http_service(mcp::make_factory(agent.clone()), session_mgr);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/v1/answer", post(crate::api::answer::http))
        .route("/rpc", post(crate::api::rpc::http))
        .route_service("/mcp", any_service(mcp_service))
        .with_state(agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::offline_agent;
    use axum::body::{to_bytes, Body};
    use hyper::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn healthz_is_ok() {
        let app = build_app(offline_agent());
        let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = build_app(offline_agent());
        let req = Request::builder().uri("/v1/translate").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
