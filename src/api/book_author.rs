//! Handlers for individual book/author links

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::infrastructure::AppState;

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub book_id: String,
    pub author_id: String,
}

#[utoipa::path(
    post,
    path = "/api/book-authors",
    responses(
        (status = 201, description = "Link created"),
        (status = 409, description = "Link already exists"),
        (status = 422, description = "Book or author does not exist")
    )
)]
pub async fn link(
    State(state): State<AppState>,
    Json(payload): Json<LinkRequest>,
) -> impl IntoResponse {
    match state
        .book_author_repo
        .link(&payload.book_id, &payload.author_id)
        .await
    {
        Ok(link) => (StatusCode::CREATED, Json(json!({ "link": link }))).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/book-authors/{book_id}/{author_id}",
    params(
        ("book_id" = String, Path, description = "Book id"),
        ("author_id" = String, Path, description = "Author id")
    ),
    responses(
        (status = 200, description = "Link removed"),
        (status = 404, description = "No such link")
    )
)]
pub async fn unlink(
    State(state): State<AppState>,
    Path((book_id, author_id)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.book_author_repo.unlink(&book_id, &author_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Link removed" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
