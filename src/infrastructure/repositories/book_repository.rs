//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::domain::{Book, BookRepository, DomainError, NewBook, validate_id};
use crate::models::author::Entity as AuthorEntity;
use crate::models::book::{ActiveModel, Column, Entity as BookEntity, Model};

impl From<Model> for Book {
    fn from(model: Model) -> Self {
        Self {
            book_id: model.book_id,
            title: model.title,
            publisher: model.publisher,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Build the row for a validated `NewBook`, generating an id when absent.
pub(crate) fn new_book_model(book: NewBook) -> ActiveModel {
    let now = chrono::Utc::now().to_rfc3339();
    let book_id = book
        .book_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    ActiveModel {
        book_id: Set(book_id),
        title: Set(book.title.trim().to_string()),
        publisher: Set(book.publisher),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    }
}

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, DomainError> {
        let books = BookEntity::find()
            .order_by_asc(Column::Title)
            .all(&self.db)
            .await?;

        Ok(books.into_iter().map(Book::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, DomainError> {
        let book = BookEntity::find_by_id(id.to_string()).one(&self.db).await?;
        Ok(book.map(Book::from))
    }

    async fn find_by_author(&self, author_id: &str) -> Result<Vec<Book>, DomainError> {
        let author = AuthorEntity::find_by_id(author_id.to_string())
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let books = author
            .find_related(BookEntity)
            .order_by_asc(Column::Title)
            .all(&self.db)
            .await?;

        Ok(books.into_iter().map(Book::from).collect())
    }

    async fn create(&self, book: NewBook) -> Result<Book, DomainError> {
        book.validate()?;

        let result = new_book_model(book).insert(&self.db).await?;
        tracing::debug!(book_id = %result.book_id, "book created");

        Ok(Book::from(result))
    }

    async fn rename(&self, id: &str, new_id: String) -> Result<Book, DomainError> {
        validate_id("book_id", &new_id)?;

        let txn = self.db.begin().await?;

        let existing = BookEntity::find_by_id(id.to_string())
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound)?;

        if existing.book_id == new_id {
            return Ok(Book::from(existing));
        }

        // Primary key updates go through update_many; ActiveModel::update
        // filters on the new key value.
        BookEntity::update_many()
            .col_expr(Column::BookId, Expr::value(new_id.clone()))
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now().to_rfc3339()))
            .filter(Column::BookId.eq(id))
            .exec(&txn)
            .await?;

        let renamed = BookEntity::find_by_id(new_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::Internal("renamed book vanished".to_string()))?;

        txn.commit().await?;
        tracing::info!(from = %id, to = %renamed.book_id, "book renamed");

        Ok(Book::from(renamed))
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let result = BookEntity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        tracing::debug!(book_id = %id, "book deleted");
        Ok(())
    }
}
