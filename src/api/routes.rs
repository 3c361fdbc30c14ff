//! API Routes

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::watch;

use crate::event_log::ConsumerState;

/// Consumer lifecycles watched by the health endpoint
#[derive(Clone, Default)]
pub struct HealthState {
    consumers: Vec<(String, watch::Receiver<ConsumerState>)>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a consumer under `name`
    pub fn with_consumer(
        mut self,
        name: impl Into<String>,
        state: watch::Receiver<ConsumerState>,
    ) -> Self {
        self.consumers.push((name.into(), state));
        self
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub consumers: BTreeMap<String, &'static str>,
}

/// Build the router
pub fn create_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check endpoint; 503 while any consumer is not running
async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let consumers: BTreeMap<String, &'static str> = state
        .consumers
        .iter()
        .map(|(name, rx)| (name.clone(), rx.borrow().as_str()))
        .collect();

    let healthy = state
        .consumers
        .iter()
        .all(|(_, rx)| *rx.borrow() == ConsumerState::Running);

    let (status, label) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            consumers,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get_health(state: HealthState) -> (StatusCode, serde_json::Value) {
        let response = create_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_all_running() {
        let (_tx, rx) = watch::channel(ConsumerState::Running);
        let (status, body) = get_health(HealthState::new().with_consumer("balance", rx)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["consumers"]["balance"], "running");
    }

    #[tokio::test]
    async fn test_health_degraded_when_consumer_stopped() {
        let (_a, running) = watch::channel(ConsumerState::Running);
        let (_b, stopped) = watch::channel(ConsumerState::Stopped);
        let state = HealthState::new()
            .with_consumer("balance", running)
            .with_consumer("activity", stopped);

        let (status, body) = get_health(state).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["consumers"]["activity"], "stopped");
    }
}
