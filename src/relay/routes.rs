//! Polling endpoints for the visualization front end

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;

use super::RelayState;

/// Body of `GET /data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeResponse {
    pub mode: String,
}

/// Create the relay router
pub fn create_router(state: Arc<RelayState>, config: &RelayConfig) -> Router {
    let cors = if config.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/data", get(get_data))
        .route("/drag", get(get_drag))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Last mode line as JSON
pub async fn get_data(State(state): State<Arc<RelayState>>) -> Json<ModeResponse> {
    Json(ModeResponse {
        mode: state.mode().await,
    })
}

/// Last drag line as plain text
pub async fn get_drag(State(state): State<Arc<RelayState>>) -> String {
    state.drag().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::NO_DATA;

    #[tokio::test]
    async fn test_get_data() {
        let state = RelayState::new();
        let Json(body) = get_data(State(state.clone())).await;
        assert_eq!(body.mode, NO_DATA);

        state.ingest_line("Right: Normal Mode").await;
        let Json(body) = get_data(State(state)).await;
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"mode": "Right: Normal Mode"})
        );
    }

    #[tokio::test]
    async fn test_get_drag() {
        let state = RelayState::new();
        state.ingest_line("Drag:5.0000,6.0000").await;
        assert_eq!(get_drag(State(state)).await, "Drag:5.0000,6.0000");
    }

    #[test]
    fn test_router_builds() {
        let _ = create_router(RelayState::new(), &RelayConfig::default());
    }
}
