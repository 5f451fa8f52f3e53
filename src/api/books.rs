//! Book API handlers using repository pattern

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::domain::{DomainError, NewBook};
use crate::infrastructure::AppState;
use crate::services::catalog_service;

#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "All books ordered by title")
    )
)]
pub async fn list_books(State(state): State<AppState>) -> impl IntoResponse {
    match state.book_repo.find_all().await {
        Ok(books) => Json(json!({
            "total": books.len(),
            "books": books,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Request DTO for creating a book, optionally with its authors
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub book_id: Option<String>,
    pub title: String,
    pub publisher: Option<String>,
    pub author_ids: Option<Vec<String>>,
}

#[utoipa::path(
    post,
    path = "/api/books",
    responses(
        (status = 201, description = "Book created"),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Book id already taken"),
        (status = 422, description = "Unknown author id")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookRequest>,
) -> impl IntoResponse {
    let input = NewBook {
        book_id: payload.book_id,
        title: payload.title,
        publisher: payload.publisher,
    };

    let result = match payload.author_ids {
        Some(author_ids) => catalog_service::register_book(state.db(), input, author_ids).await,
        None => state.book_repo.create(input).await,
    };

    match result {
        Ok(book) => (
            StatusCode::CREATED,
            Json(json!({
                "book": book,
                "message": "Book created successfully"
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book found"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.book_repo.find_by_id(&id).await {
        Ok(Some(book)) => (StatusCode::OK, Json(json!({ "book": book }))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Book not found" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book and its author links deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.book_repo.delete(&id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Book deleted successfully" })),
        )
            .into_response(),
        Err(DomainError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Book not found" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct RenameBookRequest {
    pub book_id: String,
}

#[utoipa::path(
    put,
    path = "/api/books/{id}/id",
    params(("id" = String, Path, description = "Current book id")),
    responses(
        (status = 200, description = "Book id changed; author links follow"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "New id already taken")
    )
)]
pub async fn rename_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RenameBookRequest>,
) -> impl IntoResponse {
    match state.book_repo.rename(&id, payload.book_id).await {
        Ok(book) => (StatusCode::OK, Json(json!({ "book": book }))).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/books/{id}/authors",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Authors of the book"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_book_authors(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.author_repo.find_by_book(&id).await {
        Ok(authors) => Json(json!({
            "total": authors.len(),
            "authors": authors,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplaceAuthorsRequest {
    pub author_ids: Vec<String>,
}

#[utoipa::path(
    put,
    path = "/api/books/{id}/authors",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Author set replaced"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Unknown author id")
    )
)]
pub async fn replace_book_authors(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ReplaceAuthorsRequest>,
) -> impl IntoResponse {
    match catalog_service::replace_authors(state.db(), &id, payload.author_ids).await {
        Ok(links) => Json(json!({ "links": links })).into_response(),
        Err(e) => error_response(e),
    }
}
