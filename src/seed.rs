use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::models::{author, book, book_author};

/// Demo catalog: (book id, title, publisher, author ids)
const BOOKS: &[(&str, &str, &str, &[&str])] = &[
    ("b-lotr", "The Lord of the Rings", "Allen & Unwin", &["a-tolkien"]),
    ("b-foundation", "Foundation", "Gnome Press", &["a-asimov"]),
    ("b-dune", "Dune", "Chilton Books", &["a-herbert"]),
    (
        "b-talisman",
        "The Talisman",
        "Viking",
        &["a-king", "a-straub"],
    ),
];

const AUTHORS: &[(&str, &str, &str)] = &[
    ("a-tolkien", "J.R.R. Tolkien", "1892-01-03"),
    ("a-asimov", "Isaac Asimov", "1920-01-02"),
    ("a-herbert", "Frank Herbert", "1920-10-08"),
    ("a-king", "Stephen King", "1947-09-21"),
    ("a-straub", "Peter Straub", "1943-03-02"),
];

/// Insert the demo catalog. Rows that already exist are left alone.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();
    let txn = db.begin().await?;

    for (author_id, name, born) in AUTHORS {
        let row = author::ActiveModel {
            author_id: Set(author_id.to_string()),
            name: Set(name.to_string()),
            date_of_birth: Set(Some(born.to_string())),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
        };
        author::Entity::insert(row)
            .on_conflict(
                OnConflict::column(author::Column::AuthorId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
    }

    for (book_id, title, publisher, author_ids) in BOOKS {
        let row = book::ActiveModel {
            book_id: Set(book_id.to_string()),
            title: Set(title.to_string()),
            publisher: Set(Some(publisher.to_string())),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
        };
        book::Entity::insert(row)
            .on_conflict(
                OnConflict::column(book::Column::BookId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        for author_id in author_ids.iter() {
            let link = book_author::ActiveModel {
                book_id: Set(book_id.to_string()),
                author_id: Set(author_id.to_string()),
            };
            book_author::Entity::insert(link)
                .on_conflict(
                    OnConflict::columns([
                        book_author::Column::BookId,
                        book_author::Column::AuthorId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
    }

    txn.commit().await?;
    tracing::info!(
        "Demo catalog ready: {} books, {} authors",
        BOOKS.len(),
        AUTHORS.len()
    );
    Ok(())
}
