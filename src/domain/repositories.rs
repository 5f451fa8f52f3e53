//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::DomainError;

/// Book data for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: String,
    pub title: String,
    pub publisher: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a book. A missing `book_id` is generated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBook {
    pub book_id: Option<String>,
    pub title: String,
    pub publisher: Option<String>,
}

/// Author data for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub author_id: String,
    pub name: String,
    pub date_of_birth: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating an author. A missing `author_id` is generated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAuthor {
    pub author_id: Option<String>,
    pub name: String,
    pub date_of_birth: Option<String>,
}

/// One book/author association
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookAuthor {
    pub book_id: String,
    pub author_id: String,
}

impl NewBook {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(id) = &self.book_id {
            validate_id("book_id", id)?;
        }
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation("title must not be empty".to_string()));
        }
        Ok(())
    }
}

impl NewAuthor {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(id) = &self.author_id {
            validate_id("author_id", id)?;
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Identifiers are opaque strings, but blank ones would make unreadable keys.
pub fn validate_id(field: &str, id: &str) -> Result<(), DomainError> {
    if id.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} must not be empty", field)));
    }
    if id.trim() != id {
        return Err(DomainError::Validation(format!(
            "{} must not have surrounding whitespace",
            field
        )));
    }
    Ok(())
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find all books, ordered by title
    async fn find_all(&self) -> Result<Vec<Book>, DomainError>;

    /// Find a single book by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, DomainError>;

    /// Books written by the given author
    async fn find_by_author(&self, author_id: &str) -> Result<Vec<Book>, DomainError>;

    /// Create a new book
    async fn create(&self, book: NewBook) -> Result<Book, DomainError>;

    /// Change a book's primary key. Associations follow via ON UPDATE CASCADE.
    async fn rename(&self, id: &str, new_id: String) -> Result<Book, DomainError>;

    /// Delete a book by ID. Associations are removed via ON DELETE CASCADE.
    async fn delete(&self, id: &str) -> Result<(), DomainError>;
}

/// Repository trait for Author entity
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Find all authors, ordered by name
    async fn find_all(&self) -> Result<Vec<Author>, DomainError>;

    /// Find an author by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Author>, DomainError>;

    /// Authors of the given book
    async fn find_by_book(&self, book_id: &str) -> Result<Vec<Author>, DomainError>;

    /// Create a new author
    async fn create(&self, author: NewAuthor) -> Result<Author, DomainError>;

    /// Change an author's primary key
    async fn rename(&self, id: &str, new_id: String) -> Result<Author, DomainError>;

    /// Delete an author by ID
    async fn delete(&self, id: &str) -> Result<(), DomainError>;
}

/// Repository trait for the book/author junction
#[async_trait]
pub trait BookAuthorRepository: Send + Sync {
    /// Associate a book with an author
    async fn link(&self, book_id: &str, author_id: &str) -> Result<BookAuthor, DomainError>;

    /// Remove one association
    async fn unlink(&self, book_id: &str, author_id: &str) -> Result<(), DomainError>;

    async fn list_for_book(&self, book_id: &str) -> Result<Vec<BookAuthor>, DomainError>;

    async fn list_for_author(&self, author_id: &str) -> Result<Vec<BookAuthor>, DomainError>;

    /// Total number of associations
    async fn count(&self) -> Result<u64, DomainError>;
}
