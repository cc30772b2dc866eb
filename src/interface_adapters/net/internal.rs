// Operational HTTP routes that sit next to the game socket.

use axum::{Json, response::IntoResponse};

#[derive(Debug, serde::Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
