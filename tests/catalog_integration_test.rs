use bibliolink::db;
use bibliolink::domain::{
    AuthorRepository, BookAuthorRepository, BookRepository, DomainError, NewAuthor, NewBook,
};
use bibliolink::infrastructure::{
    SeaOrmAuthorRepository, SeaOrmBookAuthorRepository, SeaOrmBookRepository,
};
use bibliolink::models::book_author;
use bibliolink::schema::{self, ReferentialAction};
use bibliolink::seed;
use bibliolink::services::catalog_service;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait, Set, Statement,
    TransactionTrait,
};

struct Repos {
    books: SeaOrmBookRepository,
    authors: SeaOrmAuthorRepository,
    links: SeaOrmBookAuthorRepository,
}

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

fn repos(db: &DatabaseConnection) -> Repos {
    Repos {
        books: SeaOrmBookRepository::new(db.clone()),
        authors: SeaOrmAuthorRepository::new(db.clone()),
        links: SeaOrmBookAuthorRepository::new(db.clone()),
    }
}

async fn create_book(repos: &Repos, id: &str, title: &str) {
    repos
        .books
        .create(NewBook {
            book_id: Some(id.to_string()),
            title: title.to_string(),
            publisher: None,
        })
        .await
        .expect("Failed to create book");
}

async fn create_author(repos: &Repos, id: &str, name: &str) {
    repos
        .authors
        .create(NewAuthor {
            author_id: Some(id.to_string()),
            name: name.to_string(),
            date_of_birth: None,
        })
        .await
        .expect("Failed to create author");
}

fn file_db_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("catalog.db").display())
}

async fn stored_fingerprint(db: &DatabaseConnection) -> String {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT fingerprint FROM schema_meta WHERE id = 1".to_owned(),
        ))
        .await
        .unwrap()
        .expect("schema_meta row missing");
    row.try_get("", "fingerprint").unwrap()
}

fn link_row(book_id: &str, author_id: &str) -> book_author::ActiveModel {
    book_author::ActiveModel {
        book_id: Set(book_id.to_string()),
        author_id: Set(author_id.to_string()),
    }
}

#[tokio::test]
async fn test_live_foreign_keys_match_declarations() {
    let db = setup_test_db().await;

    for table in schema::catalog_schemas() {
        db::verify_foreign_keys(&db, &table)
            .await
            .unwrap_or_else(|e| panic!("{}: {}", table.name, e));
    }

    let live = db::foreign_key_list(&db, "book_author").await.unwrap();
    assert_eq!(live.len(), 2);
    assert!(live.iter().all(|fk| fk.on_update == "CASCADE" && fk.on_delete == "CASCADE"));

    let mut drifted = schema::book_author_schema();
    drifted.foreign_keys[1].on_delete = ReferentialAction::Restrict;
    let err = db::verify_foreign_keys(&db, &drifted).await.unwrap_err();
    assert!(matches!(err, DomainError::Internal(_)));
}

#[tokio::test]
async fn test_schema_fingerprint_is_recorded() {
    let db = setup_test_db().await;

    assert_eq!(
        stored_fingerprint(&db).await,
        schema::schema_fingerprint(&schema::catalog_schemas())
    );
}

#[tokio::test]
async fn test_immediate_foreign_keys_fail_verification() {
    let dir = tempfile::tempdir().unwrap();
    let url = file_db_url(&dir);

    // An older build created book_author without deferred checking
    let mut immediate = schema::book_author_schema();
    for fk in &mut immediate.foreign_keys {
        fk.deferred = false;
    }
    let raw = Database::connect(url.as_str()).await.unwrap();
    for table in [schema::book_schema(), schema::author_schema(), immediate] {
        raw.execute(Statement::from_string(
            raw.get_database_backend(),
            table.create_table_sql(),
        ))
        .await
        .unwrap();
    }
    raw.close().await.unwrap();

    let db = db::init_db(&url).await.expect("Failed to init DB");

    db::verify_foreign_keys(&db, &schema::book_schema()).await.unwrap();
    db::verify_foreign_keys(&db, &schema::author_schema()).await.unwrap();
    let err = db::verify_foreign_keys(&db, &schema::book_author_schema())
        .await
        .unwrap_err();
    match err {
        DomainError::Internal(msg) => assert!(msg.contains("DEFERRABLE INITIALLY DEFERRED")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_stale_fingerprint_survives_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let url = file_db_url(&dir);

    let db = db::init_db(&url).await.expect("Failed to init DB");
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "UPDATE schema_meta SET fingerprint = 'stale' WHERE id = 1".to_owned(),
    ))
    .await
    .unwrap();
    db.close().await.unwrap();

    for _ in 0..2 {
        let db = db::init_db(&url).await.expect("Failed to init DB");
        assert_eq!(stored_fingerprint(&db).await, "stale");
        db.close().await.unwrap();
    }
}

#[tokio::test]
async fn test_link_rejects_duplicates_and_dangling_rows() {
    let db = setup_test_db().await;
    let repos = repos(&db);
    create_book(&repos, "b1", "Good Omens").await;
    create_author(&repos, "a1", "Terry Pratchett").await;

    let link = repos.links.link("b1", "a1").await.unwrap();
    assert_eq!(link.book_id, "b1");

    let dup = repos.links.link("b1", "a1").await.unwrap_err();
    assert!(matches!(dup, DomainError::Conflict(_)), "{:?}", dup);

    let dangling = repos.links.link("b1", "nobody").await.unwrap_err();
    assert!(matches!(dangling, DomainError::Constraint(_)), "{:?}", dangling);

    assert_eq!(repos.links.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_foreign_key_check_is_deferred_to_commit() {
    let db = setup_test_db().await;

    // Child first, parents after: fine once everything is in place at commit
    let txn = db.begin().await.unwrap();
    book_author::Entity::insert(link_row("b1", "a1"))
        .exec_without_returning(&txn)
        .await
        .expect("deferred insert should not fail per statement");
    txn.execute(Statement::from_string(
        txn.get_database_backend(),
        "INSERT INTO book (book_id, title, created_at, updated_at) VALUES ('b1', 'Dune', 'now', 'now')"
            .to_owned(),
    ))
    .await
    .unwrap();
    txn.execute(Statement::from_string(
        txn.get_database_backend(),
        "INSERT INTO author (author_id, name, created_at, updated_at) VALUES ('a1', 'Frank Herbert', 'now', 'now')"
            .to_owned(),
    ))
    .await
    .unwrap();
    txn.commit().await.expect("commit with satisfied references");

    // A reference that is never satisfied only fails at commit
    let txn = db.begin().await.unwrap();
    book_author::Entity::insert(link_row("b1", "ghost"))
        .exec_without_returning(&txn)
        .await
        .expect("deferred insert should not fail per statement");
    let err = txn.commit().await.unwrap_err();
    assert!(matches!(DomainError::from(err), DomainError::Constraint(_)));

    assert_eq!(book_author::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_deleting_parents_cascades_to_links() {
    let db = setup_test_db().await;
    let repos = repos(&db);
    create_book(&repos, "b1", "The Talisman").await;
    create_book(&repos, "b2", "Black House").await;
    create_author(&repos, "a1", "Stephen King").await;
    create_author(&repos, "a2", "Peter Straub").await;
    for (b, a) in [("b1", "a1"), ("b1", "a2"), ("b2", "a1"), ("b2", "a2")] {
        repos.links.link(b, a).await.unwrap();
    }

    repos.books.delete("b1").await.unwrap();
    assert_eq!(repos.links.count().await.unwrap(), 2);
    assert!(repos.links.list_for_book("b1").await.unwrap().is_empty());

    repos.authors.delete("a2").await.unwrap();
    let remaining = repos.links.list_for_author("a1").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].book_id, "b2");
    assert_eq!(repos.links.count().await.unwrap(), 1);

    assert_eq!(repos.books.delete("b1").await, Err(DomainError::NotFound));
}

#[tokio::test]
async fn test_renaming_parents_cascades_to_links() {
    let db = setup_test_db().await;
    let repos = repos(&db);
    create_book(&repos, "b1", "Foundation").await;
    create_book(&repos, "b2", "I, Robot").await;
    create_author(&repos, "a1", "Isaac Asimov").await;
    repos.links.link("b1", "a1").await.unwrap();

    let renamed = repos
        .books
        .rename("b1", "isbn-0553293354".to_string())
        .await
        .unwrap();
    assert_eq!(renamed.book_id, "isbn-0553293354");
    assert!(repos.links.list_for_book("b1").await.unwrap().is_empty());
    assert_eq!(
        repos.links.list_for_book("isbn-0553293354").await.unwrap().len(),
        1
    );

    repos
        .authors
        .rename("a1", "asimov".to_string())
        .await
        .unwrap();
    let links = repos.links.list_for_author("asimov").await.unwrap();
    assert_eq!(links[0].book_id, "isbn-0553293354");

    let taken = repos
        .books
        .rename("isbn-0553293354", "b2".to_string())
        .await
        .unwrap_err();
    assert!(matches!(taken, DomainError::Conflict(_)), "{:?}", taken);

    assert_eq!(
        repos.books.rename("missing", "x".to_string()).await,
        Err(DomainError::NotFound)
    );
    assert!(db::check_foreign_keys(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_related_queries_follow_the_junction() {
    let db = setup_test_db().await;
    let repos = repos(&db);
    create_book(&repos, "b1", "Good Omens").await;
    create_book(&repos, "b2", "American Gods").await;
    create_author(&repos, "a1", "Terry Pratchett").await;
    create_author(&repos, "a2", "Neil Gaiman").await;
    repos.links.link("b1", "a1").await.unwrap();
    repos.links.link("b1", "a2").await.unwrap();
    repos.links.link("b2", "a2").await.unwrap();

    let names: Vec<String> = repos
        .authors
        .find_by_book("b1")
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, vec!["Neil Gaiman", "Terry Pratchett"]);

    let titles: Vec<String> = repos
        .books
        .find_by_author("a2")
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(titles, vec!["American Gods", "Good Omens"]);

    assert_eq!(
        repos.books.find_by_author("nobody").await,
        Err(DomainError::NotFound)
    );
}

#[tokio::test]
async fn test_register_book_is_all_or_nothing() {
    let db = setup_test_db().await;
    let repos = repos(&db);
    create_author(&repos, "a1", "Larry Niven").await;
    create_author(&repos, "a2", "Jerry Pournelle").await;

    let book = catalog_service::register_book(
        &db,
        NewBook {
            book_id: Some("mote".to_string()),
            title: "The Mote in God's Eye".to_string(),
            publisher: Some("Simon & Schuster".to_string()),
        },
        vec!["a1".to_string(), "a2".to_string(), "a1".to_string()],
    )
    .await
    .unwrap();
    assert_eq!(book.book_id, "mote");
    assert_eq!(repos.links.list_for_book("mote").await.unwrap().len(), 2);

    let err = catalog_service::register_book(
        &db,
        NewBook {
            book_id: Some("ringworld".to_string()),
            title: "Ringworld".to_string(),
            publisher: None,
        },
        vec!["a1".to_string(), "unknown".to_string()],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DomainError::Constraint(_)), "{:?}", err);

    assert_eq!(repos.books.find_by_id("ringworld").await.unwrap(), None);
    assert_eq!(repos.links.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_register_book_generates_id() {
    let db = setup_test_db().await;
    let repos = repos(&db);
    create_author(&repos, "a1", "Ursula K. Le Guin").await;

    let book = catalog_service::register_book(
        &db,
        NewBook {
            book_id: None,
            title: "The Dispossessed".to_string(),
            publisher: None,
        },
        vec!["a1".to_string()],
    )
    .await
    .unwrap();

    assert!(uuid::Uuid::parse_str(&book.book_id).is_ok());
    let links = repos.links.list_for_author("a1").await.unwrap();
    assert_eq!(links[0].book_id, book.book_id);
}

#[tokio::test]
async fn test_replace_authors() {
    let db = setup_test_db().await;
    let repos = repos(&db);
    create_book(&repos, "b1", "The Difference Engine").await;
    create_author(&repos, "a1", "William Gibson").await;
    create_author(&repos, "a2", "Bruce Sterling").await;
    create_author(&repos, "a3", "Someone Else").await;
    repos.links.link("b1", "a3").await.unwrap();

    let links = catalog_service::replace_authors(
        &db,
        "b1",
        vec!["a2".to_string(), "a1".to_string(), "a2".to_string()],
    )
    .await
    .unwrap();
    let ids: Vec<&str> = links.iter().map(|l| l.author_id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2"]);
    assert_eq!(repos.links.list_for_book("b1").await.unwrap().len(), 2);

    // An unknown author rolls the whole replacement back
    let err = catalog_service::replace_authors(&db, "b1", vec!["zz".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Constraint(_)), "{:?}", err);
    assert_eq!(repos.links.list_for_book("b1").await.unwrap().len(), 2);

    let err = catalog_service::replace_authors(&db, "nope", vec![])
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);
}

#[tokio::test]
async fn test_merge_authors() {
    let db = setup_test_db().await;
    let repos = repos(&db);
    create_book(&repos, "b1", "Carrie").await;
    create_book(&repos, "b2", "Thinner").await;
    create_author(&repos, "king", "Stephen King").await;
    create_author(&repos, "bachman", "Richard Bachman").await;
    repos.links.link("b1", "king").await.unwrap();
    repos.links.link("b1", "bachman").await.unwrap();
    repos.links.link("b2", "bachman").await.unwrap();

    let kept = catalog_service::merge_authors(&db, "king", "bachman")
        .await
        .unwrap();
    assert_eq!(kept.author_id, "king");

    assert_eq!(repos.authors.find_by_id("bachman").await.unwrap(), None);
    let books: Vec<String> = repos
        .links
        .list_for_author("king")
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.book_id)
        .collect();
    assert_eq!(books, vec!["b1", "b2"]);
    assert_eq!(repos.links.count().await.unwrap(), 2);

    assert!(matches!(
        catalog_service::merge_authors(&db, "king", "king").await,
        Err(DomainError::Validation(_))
    ));
    assert_eq!(
        catalog_service::merge_authors(&db, "king", "bachman").await,
        Err(DomainError::NotFound)
    );
}

#[tokio::test]
async fn test_foreign_key_check_reports_dangling_rows() {
    let db = setup_test_db().await;
    let backend = db.get_database_backend();

    assert!(db::check_foreign_keys(&db).await.unwrap().is_empty());

    for sql in [
        "PRAGMA foreign_keys = OFF",
        "INSERT INTO book_author (book_id, author_id) VALUES ('lost', 'also-lost')",
        "PRAGMA foreign_keys = ON",
    ] {
        db.execute(Statement::from_string(backend, sql.to_owned()))
            .await
            .unwrap();
    }

    let violations = db::check_foreign_keys(&db).await.unwrap();
    assert_eq!(violations.len(), 2);
    assert!(violations.iter().all(|v| v.table == "book_author"));
    let mut parents: Vec<&str> = violations.iter().map(|v| v.parent.as_str()).collect();
    parents.sort();
    assert_eq!(parents, vec!["author", "book"]);
}

#[tokio::test]
async fn test_seed_is_idempotent() {
    let db = setup_test_db().await;
    let repos = repos(&db);

    seed::seed_demo_data(&db).await.unwrap();
    seed::seed_demo_data(&db).await.unwrap();

    assert_eq!(repos.books.find_all().await.unwrap().len(), 4);
    assert_eq!(repos.authors.find_all().await.unwrap().len(), 5);
    assert_eq!(repos.links.count().await.unwrap(), 5);

    let names: Vec<String> = repos
        .authors
        .find_by_book("b-talisman")
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, vec!["Peter Straub", "Stephen King"]);
}
