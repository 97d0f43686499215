// In-process transport: remote actions are served by an axum Router without a socket

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use axum::Router;
use tower::ServiceExt;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::action::{ActionRequest, ActionResponse};
use crate::infrastructure::traits::ActionTransport;

const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct RouterTransport {
    router: Router,
}

impl RouterTransport {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

#[async_trait]
impl ActionTransport for RouterTransport {
    async fn execute(&self, request: ActionRequest) -> AppResult<ActionResponse> {
        let uri = format!("/actions/{}/{}", request.model, request.action);
        let body = serde_json::to_vec(&request.params)?;
        let http_request = Request::builder()
            .method("POST")
            .uri(&uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|e| AppError::Transport(format!("could not build request for {}: {}", uri, e)))?;

        let response = self
            .router
            .clone()
            .oneshot(http_request)
            .await
            .map_err(|e| AppError::Transport(format!("{} failed: {}", uri, e)))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body(), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| AppError::Transport(format!("reading {} failed: {}", uri, e)))?;

        if !status.is_success() {
            warn!("{} answered HTTP {}", uri, status);
            return Err(AppError::Transport(format!("{} answered HTTP {}", uri, status)));
        }

        let decoded: ActionResponse = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::InvalidResponse(format!("{} sent a malformed body: {}", uri, e)))?;
        debug!("{} answered code {}", uri, decoded.code);
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::Json;
    use serde_json::{json, Value};

    fn echo_router() -> Router {
        Router::new().route(
            "/actions/{model}/{action}",
            post(|Json(params): Json<Value>| async move {
                Json(json!({"code": 2000, "data": params}))
            }),
        )
    }

    #[tokio::test]
    async fn test_round_trip_through_router() {
        let transport = RouterTransport::new(echo_router());
        let response = transport
            .execute(ActionRequest::new("tickets", "list").param("max", 3))
            .await
            .unwrap();

        assert_eq!(response.code, "2000");
        assert_eq!(response.data, Some(json!({"max": 3})));
    }

    #[tokio::test]
    async fn test_unrouted_path_is_transport_error() {
        let transport = RouterTransport::new(Router::new());
        let err = transport.execute(ActionRequest::new("tickets", "list")).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }
}
