use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use crate::db;

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "bibliolink",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Report rows whose referenced book or author is missing.
#[utoipa::path(
    get,
    path = "/api/integrity",
    responses(
        (status = 200, description = "Foreign key check result"),
        (status = 500, description = "Check could not run")
    )
)]
pub async fn integrity_check(State(db): State<DatabaseConnection>) -> impl IntoResponse {
    match db::check_foreign_keys(&db).await {
        Ok(violations) => Json(json!({
            "consistent": violations.is_empty(),
            "violations": violations,
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Database error: {}", e) })),
        )
            .into_response(),
    }
}
