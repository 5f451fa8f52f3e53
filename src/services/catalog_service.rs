//! Catalog Service - multi-row operations on books, authors and their links
//!
//! Every operation runs in one transaction. The junction's foreign keys are
//! deferred, so rows may be written in any order and referential integrity is
//! only checked when the transaction commits.

use std::collections::HashSet;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    TransactionTrait,
};

use crate::domain::{Author, Book, BookAuthor, DomainError, NewBook, validate_id};
use crate::infrastructure::repositories::book_author_repository::insert_link;
use crate::infrastructure::repositories::book_repository::new_book_model;
use crate::models::author::Entity as AuthorEntity;
use crate::models::book::Entity as BookEntity;
use crate::models::book_author::{self, Entity as BookAuthorEntity};

/// Drop repeated ids, keeping first-seen order.
fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn validate_author_ids(ids: &[String]) -> Result<(), DomainError> {
    ids.iter().try_for_each(|id| validate_id("author_id", id))
}

/// Map a commit-time foreign key failure to a readable message.
fn commit_error(e: DbErr, what: &str) -> DomainError {
    match DomainError::from(e) {
        DomainError::Constraint(_) => DomainError::Constraint(format!(
            "{} references an author or book that does not exist",
            what
        )),
        other => other,
    }
}

/// Create a book together with its author links.
///
/// The links are written before the book row exists; this only succeeds
/// because the constraint check waits for commit. If any author is unknown
/// the commit fails and nothing is stored.
pub async fn register_book(
    db: &DatabaseConnection,
    mut input: NewBook,
    author_ids: Vec<String>,
) -> Result<Book, DomainError> {
    input.validate()?;
    validate_author_ids(&author_ids)?;

    let book_id = input
        .book_id
        .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
        .clone();
    let author_ids = dedup_ids(author_ids);

    tracing::info!(
        "Register book {} with {} author(s)",
        book_id,
        author_ids.len()
    );

    let txn = db.begin().await?;

    for author_id in &author_ids {
        insert_link(&txn, &book_id, author_id).await?;
    }

    let book = new_book_model(input).insert(&txn).await?;

    txn.commit()
        .await
        .map_err(|e| commit_error(e, &format!("book '{}'", book_id)))?;

    Ok(Book::from(book))
}

/// Replace the full author set of a book.
pub async fn replace_authors(
    db: &DatabaseConnection,
    book_id: &str,
    author_ids: Vec<String>,
) -> Result<Vec<BookAuthor>, DomainError> {
    validate_author_ids(&author_ids)?;
    let author_ids = dedup_ids(author_ids);

    let txn = db.begin().await?;

    BookEntity::find_by_id(book_id.to_string())
        .one(&txn)
        .await?
        .ok_or(DomainError::NotFound)?;

    let removed = BookAuthorEntity::delete_many()
        .filter(book_author::Column::BookId.eq(book_id))
        .exec(&txn)
        .await?
        .rows_affected;

    for author_id in &author_ids {
        insert_link(&txn, book_id, author_id).await?;
    }

    txn.commit()
        .await
        .map_err(|e| commit_error(e, &format!("author list of book '{}'", book_id)))?;

    tracing::info!(
        "Replaced authors of book {}: {} removed, {} linked",
        book_id,
        removed,
        author_ids.len()
    );

    let mut links: Vec<BookAuthor> = author_ids
        .into_iter()
        .map(|author_id| BookAuthor {
            book_id: book_id.to_string(),
            author_id,
        })
        .collect();
    links.sort_by(|a, b| a.author_id.cmp(&b.author_id));
    Ok(links)
}

/// Fold `drop_id` into `keep_id`: its books move to `keep_id`, then it is
/// deleted. Books already credited to both keep a single link.
pub async fn merge_authors(
    db: &DatabaseConnection,
    keep_id: &str,
    drop_id: &str,
) -> Result<Author, DomainError> {
    if keep_id == drop_id {
        return Err(DomainError::Validation(
            "cannot merge an author into itself".to_string(),
        ));
    }

    let txn = db.begin().await?;

    let keep = AuthorEntity::find_by_id(keep_id.to_string())
        .one(&txn)
        .await?
        .ok_or(DomainError::NotFound)?;
    AuthorEntity::find_by_id(drop_id.to_string())
        .one(&txn)
        .await?
        .ok_or(DomainError::NotFound)?;

    let kept_books: HashSet<String> = BookAuthorEntity::find()
        .filter(book_author::Column::AuthorId.eq(keep_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|link| link.book_id)
        .collect();

    let moving: Vec<String> = BookAuthorEntity::find()
        .filter(book_author::Column::AuthorId.eq(drop_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|link| link.book_id)
        .filter(|book_id| !kept_books.contains(book_id))
        .collect();

    if !moving.is_empty() {
        BookAuthorEntity::update_many()
            .col_expr(book_author::Column::AuthorId, Expr::value(keep_id))
            .filter(book_author::Column::AuthorId.eq(drop_id))
            .filter(book_author::Column::BookId.is_in(moving.clone()))
            .exec(&txn)
            .await?;
    }

    // Remaining links of drop_id duplicate existing ones and go with it
    AuthorEntity::delete_by_id(drop_id.to_string())
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        "Merged author {} into {} ({} book(s) moved)",
        drop_id,
        keep_id,
        moving.len()
    );

    Ok(Author::from(keep))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_ids_keeps_first_occurrence() {
        let ids = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(dedup_ids(ids), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_validate_author_ids_rejects_blank() {
        let ids = vec!["a1".to_string(), " ".to_string()];
        assert!(matches!(
            validate_author_ids(&ids),
            Err(DomainError::Validation(_))
        ));
    }
}
