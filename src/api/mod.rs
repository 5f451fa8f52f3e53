pub mod author;
pub mod book_author;
pub mod books;
pub mod health;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::AppState;

/// Map a domain failure to an HTTP status with an `{"error": ...}` body.
pub(crate) fn error_response(e: DomainError) -> Response {
    let status = match &e {
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Constraint(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Database(_) | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    }

    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/integrity", get(health::integrity_check))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).delete(books::delete_book),
        )
        .route("/books/:id/id", put(books::rename_book))
        .route(
            "/books/:id/authors",
            get(books::list_book_authors).put(books::replace_book_authors),
        )
        // Authors
        .route("/authors", get(author::list_authors).post(author::create_author))
        .route(
            "/authors/:id",
            get(author::get_author).delete(author::delete_author),
        )
        .route("/authors/:id/books", get(author::list_author_books))
        .route("/authors/:id/merge", post(author::merge_author))
        // Book/author links
        .route("/book-authors", post(book_author::link))
        .route(
            "/book-authors/:book_id/:author_id",
            delete(book_author::unlink),
        )
        .with_state(state)
}
