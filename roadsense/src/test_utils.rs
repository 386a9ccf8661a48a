//! Test utilities for integration testing.

use std::sync::Arc;

use axum_test::TestServer;
use sqlx::PgPool;

use crate::api::models::processed_agent_data::ProcessedAgentDataResponse;
use crate::config::Config;
use crate::db::models::processed_agent_data::ProcessedAgentDataCreateDBRequest;
use crate::subscriptions::SubscriptionRegistry;
use crate::types::{RecordId, UserId};
use crate::{AppState, build_router};

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    }
}

/// Build a test server around an existing pool (migrations are applied by
/// `#[sqlx::test]`). Uses a real HTTP transport so WebSocket upgrades work.
/// Also returns the state so tests can observe the subscription registry.
pub async fn create_test_server(pool: PgPool) -> (TestServer, AppState) {
    let state = AppState::builder()
        .db(pool)
        .config(create_test_config())
        .subscriptions(Arc::new(SubscriptionRegistry::new()))
        .build();

    let router = build_router(&state).expect("Failed to build router");
    let server = TestServer::builder()
        .http_transport()
        .build(router)
        .expect("Failed to create test server");

    (server, state)
}

/// A valid create payload in wire shape.
pub fn sample_payload(user_id: UserId, road_state: &str) -> serde_json::Value {
    serde_json::json!({
        "road_state": road_state,
        "agent_data": {
            "user_id": user_id,
            "accelerometer": { "x": 0.1, "y": 0.2, "z": 9.8 },
            "gps": { "latitude": 50.45, "longitude": 30.52 },
            "timestamp": "2024-01-01T00:00:00Z"
        }
    })
}

/// A valid repository write-model.
pub fn sample_create_request(user_id: UserId, road_state: &str) -> ProcessedAgentDataCreateDBRequest {
    ProcessedAgentDataCreateDBRequest {
        road_state: road_state.to_string(),
        user_id,
        x: 0.1,
        y: 0.2,
        z: 9.8,
        latitude: 50.45,
        longitude: 30.52,
        timestamp: "2024-01-01T00:00:00Z".parse().expect("Timestamp should parse"),
    }
}

/// A stored record as it would come back from the repository.
pub fn sample_response(id: RecordId, user_id: UserId, road_state: &str) -> ProcessedAgentDataResponse {
    ProcessedAgentDataResponse {
        id,
        road_state: road_state.to_string(),
        user_id,
        x: 0.1,
        y: 0.2,
        z: 9.8,
        latitude: 50.45,
        longitude: 30.52,
        timestamp: "2024-01-01T00:00:00Z".parse().expect("Timestamp should parse"),
    }
}
