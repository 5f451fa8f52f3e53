use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::domain::{DomainError, NewAuthor};
use crate::infrastructure::AppState;
use crate::services::catalog_service;

#[derive(Deserialize)]
pub struct CreateAuthorRequest {
    author_id: Option<String>,
    name: String,
    date_of_birth: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/authors",
    responses((status = 200, description = "All authors ordered by name"))
)]
pub async fn list_authors(State(state): State<AppState>) -> impl IntoResponse {
    match state.author_repo.find_all().await {
        Ok(authors) => (StatusCode::OK, Json(authors)).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/authors",
    responses(
        (status = 201, description = "Author created"),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Author id already taken")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    Json(payload): Json<CreateAuthorRequest>,
) -> impl IntoResponse {
    let input = NewAuthor {
        author_id: payload.author_id,
        name: payload.name,
        date_of_birth: payload.date_of_birth,
    };

    match state.author_repo.create(input).await {
        Ok(author) => (StatusCode::CREATED, Json(author)).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/authors/{id}",
    params(("id" = String, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author found"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.author_repo.find_by_id(&id).await {
        Ok(Some(author)) => (StatusCode::OK, Json(author)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Author not found" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/authors/{id}",
    params(("id" = String, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author and its book links deleted"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.author_repo.delete(&id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "Author deleted" }))).into_response(),
        Err(DomainError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Author not found" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/authors/{id}/books",
    params(("id" = String, Path, description = "Author id")),
    responses(
        (status = 200, description = "Books by the author"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn list_author_books(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.book_repo.find_by_author(&id).await {
        Ok(books) => Json(json!({
            "total": books.len(),
            "books": books,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct MergeAuthorRequest {
    /// Author folded into the one named in the path, then deleted
    merge_id: String,
}

#[utoipa::path(
    post,
    path = "/api/authors/{id}/merge",
    params(("id" = String, Path, description = "Author that is kept")),
    responses(
        (status = 200, description = "Authors merged"),
        (status = 400, description = "Merge into self"),
        (status = 404, description = "Either author not found")
    )
)]
pub async fn merge_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<MergeAuthorRequest>,
) -> impl IntoResponse {
    match catalog_service::merge_authors(state.db(), &id, &payload.merge_id).await {
        Ok(author) => (StatusCode::OK, Json(json!({ "author": author }))).into_response(),
        Err(e) => error_response(e),
    }
}
