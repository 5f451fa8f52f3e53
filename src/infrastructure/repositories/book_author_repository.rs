//! SeaORM implementation of BookAuthorRepository

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::domain::{BookAuthor, BookAuthorRepository, DomainError, validate_id};
use crate::models::book_author::{ActiveModel, Column, Entity as BookAuthorEntity, Model};

impl From<Model> for BookAuthor {
    fn from(m: Model) -> Self {
        Self {
            book_id: m.book_id,
            author_id: m.author_id,
        }
    }
}

/// Insert one association on any connection or transaction.
///
/// Foreign keys are deferred, so inside a transaction a dangling row is only
/// rejected when the transaction commits.
pub(crate) async fn insert_link<C: ConnectionTrait>(
    conn: &C,
    book_id: &str,
    author_id: &str,
) -> Result<(), DbErr> {
    let row = ActiveModel {
        book_id: Set(book_id.to_string()),
        author_id: Set(author_id.to_string()),
    };
    BookAuthorEntity::insert(row)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// SeaORM-based implementation of BookAuthorRepository
pub struct SeaOrmBookAuthorRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookAuthorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookAuthorRepository for SeaOrmBookAuthorRepository {
    async fn link(&self, book_id: &str, author_id: &str) -> Result<BookAuthor, DomainError> {
        validate_id("book_id", book_id)?;
        validate_id("author_id", author_id)?;

        insert_link(&self.db, book_id, author_id)
            .await
            .map_err(|e| match DomainError::from(e) {
                DomainError::Conflict(_) => DomainError::Conflict(format!(
                    "book '{}' is already linked to author '{}'",
                    book_id, author_id
                )),
                DomainError::Constraint(_) => DomainError::Constraint(format!(
                    "book '{}' or author '{}' does not exist",
                    book_id, author_id
                )),
                other => other,
            })?;

        tracing::debug!(book_id, author_id, "author linked");
        Ok(BookAuthor {
            book_id: book_id.to_string(),
            author_id: author_id.to_string(),
        })
    }

    async fn unlink(&self, book_id: &str, author_id: &str) -> Result<(), DomainError> {
        let result = BookAuthorEntity::delete_by_id((book_id.to_string(), author_id.to_string()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        tracing::debug!(book_id, author_id, "author unlinked");
        Ok(())
    }

    async fn list_for_book(&self, book_id: &str) -> Result<Vec<BookAuthor>, DomainError> {
        let rows = BookAuthorEntity::find()
            .filter(Column::BookId.eq(book_id))
            .order_by_asc(Column::AuthorId)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(BookAuthor::from).collect())
    }

    async fn list_for_author(&self, author_id: &str) -> Result<Vec<BookAuthor>, DomainError> {
        let rows = BookAuthorEntity::find()
            .filter(Column::AuthorId.eq(author_id))
            .order_by_asc(Column::BookId)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(BookAuthor::from).collect())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(BookAuthorEntity::find().count(&self.db).await?)
    }
}
