//! SeaORM implementation of AuthorRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::domain::{Author, AuthorRepository, DomainError, NewAuthor, validate_id};
use crate::models::author::{ActiveModel, Column, Entity as AuthorEntity, Model};
use crate::models::book::Entity as BookEntity;

impl From<Model> for Author {
    fn from(a: Model) -> Self {
        Self {
            author_id: a.author_id,
            name: a.name,
            date_of_birth: a.date_of_birth,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// SeaORM-based implementation of AuthorRepository
pub struct SeaOrmAuthorRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuthorRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthorRepository for SeaOrmAuthorRepository {
    async fn find_all(&self) -> Result<Vec<Author>, DomainError> {
        let authors = AuthorEntity::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?;

        Ok(authors.into_iter().map(Author::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Author>, DomainError> {
        let author = AuthorEntity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;

        Ok(author.map(Author::from))
    }

    async fn find_by_book(&self, book_id: &str) -> Result<Vec<Author>, DomainError> {
        let book = BookEntity::find_by_id(book_id.to_string())
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        let authors = book
            .find_related(AuthorEntity)
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?;

        Ok(authors.into_iter().map(Author::from).collect())
    }

    async fn create(&self, author: NewAuthor) -> Result<Author, DomainError> {
        author.validate()?;

        let now = chrono::Utc::now().to_rfc3339();
        let author_id = author
            .author_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let model = ActiveModel {
            author_id: Set(author_id),
            name: Set(author.name.trim().to_string()),
            date_of_birth: Set(author.date_of_birth),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let result = model.insert(&self.db).await?;
        tracing::debug!(author_id = %result.author_id, "author created");

        Ok(Author::from(result))
    }

    async fn rename(&self, id: &str, new_id: String) -> Result<Author, DomainError> {
        validate_id("author_id", &new_id)?;

        let txn = self.db.begin().await?;

        let existing = AuthorEntity::find_by_id(id.to_string())
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound)?;

        if existing.author_id == new_id {
            return Ok(Author::from(existing));
        }

        AuthorEntity::update_many()
            .col_expr(Column::AuthorId, Expr::value(new_id.clone()))
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now().to_rfc3339()))
            .filter(Column::AuthorId.eq(id))
            .exec(&txn)
            .await?;

        let renamed = AuthorEntity::find_by_id(new_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::Internal("renamed author vanished".to_string()))?;

        txn.commit().await?;
        tracing::info!(from = %id, to = %renamed.author_id, "author renamed");

        Ok(Author::from(renamed))
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let result = AuthorEntity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }
}
