use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{response::ApiResponse, state::AppState};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub service: &'static str,
    pub database: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Response {
    match state.users.ping().await {
        Ok(()) => ApiResponse::ok(
            "Service is healthy",
            HealthStatus {
                service: "ok",
                database: "up",
            },
        )
        .into_response(),
        Err(e) => {
            warn!(error = %e, "health check: storage ping failed");
            ApiResponse::with_status(
                StatusCode::SERVICE_UNAVAILABLE,
                "Storage is unavailable",
                HealthStatus {
                    service: "ok",
                    database: "down",
                },
            )
            .into_response()
        }
    }
}

pub async fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}
