use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.directory.health_check().await {
        Ok(()) => "ok",
        Err(_) => "unavailable",
    };
    let status = if database == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ok" } else { "degraded" },
            "service": "portal",
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
        })),
    )
}
