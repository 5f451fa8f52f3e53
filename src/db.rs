use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, QueryResult, Statement, Value,
};
use serde::Serialize;

use crate::domain::DomainError;
use crate::schema::{self, ReferentialAction, TableSchema};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Cascades and deferred checks are inert unless enforcement is on
    exec(&db, "PRAGMA foreign_keys = ON").await?;

    run_migrations(&db).await?;

    Ok(db)
}

async fn exec(db: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_owned()))
        .await?;
    Ok(())
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schemas = schema::catalog_schemas();

    schema::validate_catalog(&schemas)
        .map_err(|e| DbErr::Custom(format!("invalid schema: {}", e)))?;

    for table in &schemas {
        exec(db, &table.create_table_sql()).await?;
        for index in table.index_sql() {
            exec(db, &index).await?;
        }
    }

    exec(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS schema_meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            fingerprint TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .await?;

    let fingerprint = schema::schema_fingerprint(&schemas);
    let backend = db.get_database_backend();
    let stored = db
        .query_one(Statement::from_string(
            backend,
            "SELECT fingerprint FROM schema_meta WHERE id = 1".to_owned(),
        ))
        .await?
        .map(|row| row.try_get::<String>("", "fingerprint"))
        .transpose()?;

    let now = Value::from(chrono::Utc::now().to_rfc3339());
    match stored {
        Some(existing) if existing == fingerprint => {
            tracing::debug!("Catalog schema up to date ({})", &fingerprint[..12]);
            db.execute(Statement::from_sql_and_values(
                backend,
                "UPDATE schema_meta SET updated_at = ? WHERE id = 1",
                [now],
            ))
            .await?;
        }
        Some(existing) => {
            // CREATE TABLE IF NOT EXISTS leaves an older table untouched, so
            // the stored fingerprint keeps describing what is on disk
            tracing::warn!(
                "Catalog schema fingerprint changed ({} -> {}); existing tables were not rebuilt",
                &existing[..existing.len().min(12)],
                &fingerprint[..12]
            );
        }
        None => {
            tracing::info!("Catalog schema created ({})", &fingerprint[..12]);
            db.execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO schema_meta (id, fingerprint, updated_at) VALUES (1, ?, ?)",
                [Value::from(fingerprint), now],
            ))
            .await?;
        }
    }

    Ok(())
}

/// One foreign key as SQLite reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    pub id: i64,
    pub parent_table: String,
    pub child_column: String,
    pub parent_column: Option<String>,
    pub on_update: String,
    pub on_delete: String,
}

impl ForeignKeyInfo {
    fn from_row(row: &QueryResult) -> Result<Self, DbErr> {
        Ok(Self {
            id: row.try_get("", "id")?,
            parent_table: row.try_get("", "table")?,
            child_column: row.try_get("", "from")?,
            parent_column: row.try_get("", "to")?,
            on_update: row.try_get("", "on_update")?,
            on_delete: row.try_get("", "on_delete")?,
        })
    }
}

pub async fn foreign_key_list(
    db: &DatabaseConnection,
    table: &str,
) -> Result<Vec<ForeignKeyInfo>, DbErr> {
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            format!("PRAGMA foreign_key_list({})", table),
        ))
        .await?;

    rows.iter().map(ForeignKeyInfo::from_row).collect()
}

/// The `CREATE TABLE` statement SQLite stored for `table`.
pub async fn table_sql(db: &DatabaseConnection, table: &str) -> Result<Option<String>, DbErr> {
    db.query_one(Statement::from_sql_and_values(
        db.get_database_backend(),
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
        [Value::from(table)],
    ))
    .await?
    .map(|row| row.try_get::<String>("", "sql"))
    .transpose()
}

/// Whether the table-level `FOREIGN KEY (child_columns)` clause in
/// `table_sql` is `DEFERRABLE INITIALLY DEFERRED`. `PRAGMA foreign_key_list`
/// does not report deferral, so the stored DDL is the only source.
fn foreign_key_is_deferred(table_sql: &str, child_columns: &[&str]) -> bool {
    let normalized: String = table_sql
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '"' | '`' | '[' | ']'))
        .collect::<String>()
        .to_ascii_uppercase();
    let head = format!("{})", child_columns.join(",").to_ascii_uppercase());

    normalized
        .split("FOREIGNKEY(")
        .skip(1)
        .find(|clause| clause.starts_with(&head))
        .is_some_and(|clause| {
            clause.contains("DEFERRABLEINITIALLYDEFERRED") && !clause.contains("NOTDEFERRABLE")
        })
}

/// Compare the live foreign keys of `table` with its declaration.
pub async fn verify_foreign_keys(
    db: &DatabaseConnection,
    table: &TableSchema,
) -> Result<(), DomainError> {
    let live = foreign_key_list(db, table.name).await?;

    for fk in &table.foreign_keys {
        for (child, parent) in fk.child_columns.iter().zip(&fk.parent_columns) {
            let found = live.iter().find(|info| {
                info.parent_table == fk.parent_table
                    && info.child_column == *child
                    && info.parent_column.as_deref().is_none_or(|p| p == *parent)
            });

            let Some(info) = found else {
                return Err(DomainError::Internal(format!(
                    "{}.{} has no foreign key to {}.{}",
                    table.name, child, fk.parent_table, parent
                )));
            };

            let actions = (
                ReferentialAction::from_sql(&info.on_update),
                ReferentialAction::from_sql(&info.on_delete),
            );
            if actions != (Some(fk.on_update), Some(fk.on_delete)) {
                return Err(DomainError::Internal(format!(
                    "{}.{} -> {}: expected ON UPDATE {} ON DELETE {}, found ON UPDATE {} ON DELETE {}",
                    table.name,
                    child,
                    fk.parent_table,
                    fk.on_update,
                    fk.on_delete,
                    info.on_update,
                    info.on_delete
                )));
            }
        }
    }

    let sql = table_sql(db, table.name)
        .await?
        .ok_or_else(|| DomainError::Internal(format!("table {} does not exist", table.name)))?;
    for fk in &table.foreign_keys {
        if foreign_key_is_deferred(&sql, &fk.child_columns) != fk.deferred {
            let expected = if fk.deferred {
                "DEFERRABLE INITIALLY DEFERRED"
            } else {
                "immediate checking"
            };
            return Err(DomainError::Internal(format!(
                "{}({}) -> {}: expected {}",
                table.name,
                fk.child_columns.join(", "),
                fk.parent_table,
                expected
            )));
        }
    }

    let declared: usize = table.foreign_keys.iter().map(|fk| fk.child_columns.len()).sum();
    if live.len() != declared {
        return Err(DomainError::Internal(format!(
            "{} declares {} foreign key columns but the database has {}",
            table.name,
            declared,
            live.len()
        )));
    }

    Ok(())
}

/// A row whose parent is missing, as reported by `PRAGMA foreign_key_check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyViolation {
    pub table: String,
    pub rowid: Option<i64>,
    pub parent: String,
    pub fk_index: i64,
}

/// Dangling rows across the whole database. Empty when the data is consistent.
pub async fn check_foreign_keys(
    db: &DatabaseConnection,
) -> Result<Vec<ForeignKeyViolation>, DbErr> {
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            "PRAGMA foreign_key_check".to_owned(),
        ))
        .await?;

    rows.iter()
        .map(|row| {
            Ok(ForeignKeyViolation {
                table: row.try_get("", "table")?,
                rowid: row.try_get("", "rowid")?,
                parent: row.try_get("", "parent")?,
                fk_index: row.try_get("", "fkid")?,
            })
        })
        .collect()
}
