//! Health check endpoint handlers.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub face_match: FaceMatchHealth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FaceMatchHealth {
    pub enabled: bool,
    pub required: bool,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let face_match = &state.config.face_match;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        face_match: FaceMatchHealth {
            enabled: face_match.enabled,
            required: face_match.required,
        },
    })
}

/// Liveness probe: 200 while the process runs.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe. The directory is loaded before the router exists, so a
/// serving process is ready.
pub async fn ready() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ready".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.3.0".to_string(),
            face_match: FaceMatchHealth {
                enabled: true,
                required: false,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["face_match"]["enabled"], true);
    }

    #[tokio::test]
    async fn test_live_and_ready() {
        assert_eq!(live().await.0.status, "alive");
        assert_eq!(ready().await.0.status, "ready");
    }
}
