//! Declarative table definitions
//!
//! The entities in [`crate::models`] describe row shapes for SeaORM. The
//! constraint side of the catalog (composite keys, cascade rules, deferred
//! checking) lives here as plain data and is rendered to SQLite DDL by
//! [`TableSchema::create_table_sql`].

use std::collections::HashSet;
use std::fmt;

use sha2::{Digest, Sha256};

/// What the store does to child rows when the referenced parent key changes
/// or disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Cascade => "CASCADE",
        }
    }

    /// Parse the spelling reported by `PRAGMA foreign_key_list`.
    pub fn from_sql(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NO ACTION" => Some(ReferentialAction::NoAction),
            "RESTRICT" => Some(ReferentialAction::Restrict),
            "SET NULL" => Some(ReferentialAction::SetNull),
            "SET DEFAULT" => Some(ReferentialAction::SetDefault),
            "CASCADE" => Some(ReferentialAction::Cascade),
            _ => None,
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
}

impl ColumnSpec {
    pub const fn required(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
        }
    }

    pub const fn optional(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
        }
    }
}

/// A child-to-parent reference. Columns pair up positionally:
/// `child_columns[i]` references `parent_columns[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeySpec {
    pub parent_table: &'static str,
    pub parent_columns: Vec<&'static str>,
    pub child_columns: Vec<&'static str>,
    pub on_update: ReferentialAction,
    pub on_delete: ReferentialAction,
    /// Check at commit instead of at the end of each statement.
    pub deferred: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: Vec<ColumnSpec>,
    pub primary_key: Vec<&'static str>,
    pub foreign_keys: Vec<ForeignKeySpec>,
}

/// Reasons a [`TableSchema`] cannot be turned into DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    EmptyTableName,
    NoColumns { table: String },
    DuplicateColumn { table: String, column: String },
    EmptyPrimaryKey { table: String },
    UnknownPrimaryKeyColumn { table: String, column: String },
    NullablePrimaryKeyColumn { table: String, column: String },
    EmptyForeignKey { table: String, parent: String },
    ForeignKeyArity {
        table: String,
        parent: String,
        child_count: usize,
        parent_count: usize,
    },
    UnknownForeignKeyColumn {
        table: String,
        column: String,
    },
    /// Parent table missing or declared after the child.
    UnknownParentTable { table: String, parent: String },
    /// SQLite only accepts references to the parent's key columns.
    ParentKeyMismatch {
        table: String,
        parent: String,
        columns: Vec<String>,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::EmptyTableName => write!(f, "table name is empty"),
            SchemaError::NoColumns { table } => write!(f, "table '{}' declares no columns", table),
            SchemaError::DuplicateColumn { table, column } => {
                write!(f, "table '{}' declares column '{}' twice", table, column)
            }
            SchemaError::EmptyPrimaryKey { table } => {
                write!(f, "table '{}' has no primary key", table)
            }
            SchemaError::UnknownPrimaryKeyColumn { table, column } => write!(
                f,
                "primary key of '{}' names unknown column '{}'",
                table, column
            ),
            SchemaError::NullablePrimaryKeyColumn { table, column } => write!(
                f,
                "primary key column '{}.{}' must not be nullable",
                table, column
            ),
            SchemaError::EmptyForeignKey { table, parent } => write!(
                f,
                "foreign key from '{}' to '{}' lists no columns",
                table, parent
            ),
            SchemaError::ForeignKeyArity {
                table,
                parent,
                child_count,
                parent_count,
            } => write!(
                f,
                "foreign key from '{}' to '{}' maps {} child columns onto {} parent columns",
                table, parent, child_count, parent_count
            ),
            SchemaError::UnknownForeignKeyColumn { table, column } => write!(
                f,
                "foreign key of '{}' names unknown child column '{}'",
                table, column
            ),
            SchemaError::UnknownParentTable { table, parent } => write!(
                f,
                "foreign key of '{}' references '{}', which is not declared before it",
                table, parent
            ),
            SchemaError::ParentKeyMismatch {
                table,
                parent,
                columns,
            } => write!(
                f,
                "foreign key of '{}' references ({}) which is not the primary key of '{}'",
                table,
                columns.join(", "),
                parent
            ),
        }
    }
}

impl std::error::Error for SchemaError {}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let table = self.name.to_string();
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyTableName);
        }
        if self.columns.is_empty() {
            return Err(SchemaError::NoColumns { table });
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name) {
                return Err(SchemaError::DuplicateColumn {
                    table,
                    column: column.name.to_string(),
                });
            }
        }

        if self.primary_key.is_empty() {
            return Err(SchemaError::EmptyPrimaryKey { table });
        }
        for name in &self.primary_key {
            match self.column(name) {
                None => {
                    return Err(SchemaError::UnknownPrimaryKeyColumn {
                        table,
                        column: name.to_string(),
                    });
                }
                // SQLite tolerates NULL in non-INTEGER primary keys, which
                // would defeat the uniqueness of the pair.
                Some(c) if c.nullable => {
                    return Err(SchemaError::NullablePrimaryKeyColumn {
                        table,
                        column: name.to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        for fk in &self.foreign_keys {
            let parent = fk.parent_table.to_string();
            if fk.child_columns.is_empty() || fk.parent_columns.is_empty() {
                return Err(SchemaError::EmptyForeignKey { table, parent });
            }
            if fk.child_columns.len() != fk.parent_columns.len() {
                return Err(SchemaError::ForeignKeyArity {
                    table,
                    parent,
                    child_count: fk.child_columns.len(),
                    parent_count: fk.parent_columns.len(),
                });
            }
            if let Some(missing) = fk.child_columns.iter().find(|c| self.column(c).is_none()) {
                return Err(SchemaError::UnknownForeignKeyColumn {
                    table,
                    column: missing.to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn create_table_sql(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if c.nullable {
                    format!("{} {}", c.name, c.sql_type)
                } else {
                    format!("{} {} NOT NULL", c.name, c.sql_type)
                }
            })
            .collect();

        lines.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));

        for fk in &self.foreign_keys {
            let mut clause = format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
                fk.child_columns.join(", "),
                fk.parent_table,
                fk.parent_columns.join(", "),
                fk.on_update,
                fk.on_delete
            );
            if fk.deferred {
                clause.push_str(" DEFERRABLE INITIALLY DEFERRED");
            }
            lines.push(clause);
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            lines.join(",\n    ")
        )
    }

    /// Index statements for foreign keys the primary key index does not
    /// already cover.
    pub fn index_sql(&self) -> Vec<String> {
        self.foreign_keys
            .iter()
            .filter(|fk| !self.primary_key.starts_with(&fk.child_columns))
            .map(|fk| {
                format!(
                    "CREATE INDEX IF NOT EXISTS index_{}_{} ON {} ({})",
                    self.name,
                    fk.child_columns.join("_"),
                    self.name,
                    fk.child_columns.join(", ")
                )
            })
            .collect()
    }
}

pub fn book_schema() -> TableSchema {
    TableSchema {
        name: "book",
        columns: vec![
            ColumnSpec::required("book_id", "TEXT"),
            ColumnSpec::required("title", "TEXT"),
            ColumnSpec::optional("publisher", "TEXT"),
            ColumnSpec::required("created_at", "TEXT"),
            ColumnSpec::required("updated_at", "TEXT"),
        ],
        primary_key: vec!["book_id"],
        foreign_keys: vec![],
    }
}

pub fn author_schema() -> TableSchema {
    TableSchema {
        name: "author",
        columns: vec![
            ColumnSpec::required("author_id", "TEXT"),
            ColumnSpec::required("name", "TEXT"),
            ColumnSpec::optional("date_of_birth", "TEXT"),
            ColumnSpec::required("created_at", "TEXT"),
            ColumnSpec::required("updated_at", "TEXT"),
        ],
        primary_key: vec!["author_id"],
        foreign_keys: vec![],
    }
}

pub fn book_author_schema() -> TableSchema {
    TableSchema {
        name: "book_author",
        columns: vec![
            ColumnSpec::required("book_id", "TEXT"),
            ColumnSpec::required("author_id", "TEXT"),
        ],
        primary_key: vec!["book_id", "author_id"],
        foreign_keys: vec![
            ForeignKeySpec {
                parent_table: "book",
                parent_columns: vec!["book_id"],
                child_columns: vec!["book_id"],
                on_update: ReferentialAction::Cascade,
                on_delete: ReferentialAction::Cascade,
                deferred: true,
            },
            ForeignKeySpec {
                parent_table: "author",
                parent_columns: vec!["author_id"],
                child_columns: vec!["author_id"],
                on_update: ReferentialAction::Cascade,
                on_delete: ReferentialAction::Cascade,
                deferred: true,
            },
        ],
    }
}

/// All catalog tables, parents before children.
pub fn catalog_schemas() -> Vec<TableSchema> {
    vec![book_schema(), author_schema(), book_author_schema()]
}

/// Validate every table, then check each foreign key against the primary
/// key of a parent declared earlier in `schemas`.
pub fn validate_catalog(schemas: &[TableSchema]) -> Result<(), SchemaError> {
    for (pos, table) in schemas.iter().enumerate() {
        table.validate()?;

        for fk in &table.foreign_keys {
            let Some(parent) = schemas[..pos].iter().find(|s| s.name == fk.parent_table) else {
                return Err(SchemaError::UnknownParentTable {
                    table: table.name.to_string(),
                    parent: fk.parent_table.to_string(),
                });
            };

            if parent.primary_key != fk.parent_columns {
                return Err(SchemaError::ParentKeyMismatch {
                    table: table.name.to_string(),
                    parent: parent.name.to_string(),
                    columns: fk.parent_columns.iter().map(|c| c.to_string()).collect(),
                });
            }
        }
    }
    Ok(())
}

/// Hex SHA-256 over the rendered DDL of `schemas`, in order.
pub fn schema_fingerprint(schemas: &[TableSchema]) -> String {
    let mut hasher = Sha256::new();
    for schema in schemas {
        hasher.update(schema.create_table_sql().as_bytes());
        for index in schema.index_sql() {
            hasher.update(b"\n");
            hasher.update(index.as_bytes());
        }
        hasher.update(b";\n");
    }
    hex::encode(hasher.finalize())
}
