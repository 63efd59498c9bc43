use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    bots: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        bots: state.manager.bot_count(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::{BotManager, MemoryStore};
    use std::sync::Arc;
    use tokio::sync::broadcast;

    fn test_state() -> AppState {
        let (stats_tx, _) = broadcast::channel(8);
        AppState {
            config: Arc::new(Config::default()),
            manager: Arc::new(BotManager::new(Arc::new(MemoryStore::default()))),
            stats_tx,
        }
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok",
            version: "1.0.0",
            bots: 3,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"version\":\"1.0.0\""));
        assert!(json.contains("\"bots\":3"));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let Json(response) = health(State(test_state())).await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(response.bots, 0);
    }
}
