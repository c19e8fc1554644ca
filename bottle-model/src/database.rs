//! # Database Module
//!
//! A sqlx-backed [`SchemaIntrospector`]. It handles connection pooling,
//! driver detection and column introspection across PostgreSQL, MySQL and
//! SQLite.

// ============================================================================
// External Crate Imports
// ============================================================================

use async_trait::async_trait;
use heck::ToSnakeCase;
use sqlx::{any::AnyArguments, error::BoxDynError, AnyPool, Arguments, Row};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    schema::{ColumnDescriptor, SchemaIntrospector, SemanticType, TableIdentity},
    Error,
};

// ============================================================================
// Database Driver Enum
// ============================================================================

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drivers {
    /// PostgreSQL driver
    Postgres,
    /// MySQL driver
    MySQL,
    /// SQLite driver
    SQLite,
}

impl Drivers {
    /// Detects the driver from a connection URL.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres") {
            Drivers::Postgres
        } else if url.starts_with("mysql") || url.starts_with("mariadb") {
            Drivers::MySQL
        } else {
            Drivers::SQLite
        }
    }
}

// ============================================================================
// Database Struct
// ============================================================================

/// A connection pool that introspects table columns.
///
/// Thread-safe and cheap to clone (the pool is reference counted).
#[derive(Debug, Clone)]
pub struct Database {
    /// The underlying SQLx connection pool
    pub(crate) pool: AnyPool,
    /// The detected database driver
    pub(crate) driver: Drivers,
}

impl Database {
    /// Creates a new DatabaseBuilder for configuring the connection.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Connects to a database using the provided connection string.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        DatabaseBuilder::new().connect(url).await
    }

    pub fn driver(&self) -> Drivers {
        self.driver
    }

    /// Creates a raw SQL statement.
    pub fn raw<'a>(&self, sql: &'a str) -> RawQuery<'a> {
        RawQuery::new(self.clone(), sql)
    }

    /// Checks if a table exists in the database.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool, Error> {
        let table_name_snake = table_name.to_snake_case();
        let query = match self.driver {
            Drivers::Postgres => {
                "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1 AND table_schema = 'public')"
            }
            Drivers::MySQL => {
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = ? AND table_schema = DATABASE())"
            }
            Drivers::SQLite => "SELECT count(*) FROM sqlite_master WHERE type='table' AND name=?",
        };

        let row = sqlx::query(query).bind(&table_name_snake).fetch_one(&self.pool).await?;

        match self.driver {
            Drivers::SQLite => {
                let count: i64 = row.try_get(0)?;
                Ok(count > 0)
            }
            _ => {
                let exists: bool = row.try_get(0)?;
                Ok(exists)
            }
        }
    }

    /// Returns the current column names of a table.
    pub async fn get_table_columns(&self, table_name: &str) -> Result<Vec<String>, Error> {
        let columns = self.list_table_columns(&TableIdentity::new(table_name)).await?;
        Ok(columns.into_iter().map(|(name, _)| name).collect())
    }

    /// Returns `(name, declared type)` for every column, in ordinal order.
    pub async fn list_table_columns(&self, table: &TableIdentity) -> Result<Vec<(String, String)>, Error> {
        let table_name = &table.table;
        let rows = match (self.driver, &table.database) {
            (Drivers::SQLite, None) => {
                let query = format!("PRAGMA table_info(\"{}\")", table_name);
                sqlx::query(&query).fetch_all(&self.pool).await?
            }
            (Drivers::SQLite, Some(database)) => {
                let query = format!("PRAGMA \"{}\".table_info(\"{}\")", database, table_name);
                sqlx::query(&query).fetch_all(&self.pool).await?
            }
            (Drivers::Postgres, database) => {
                let query = "SELECT column_name::TEXT, data_type::TEXT FROM information_schema.columns \
                             WHERE table_name = $1 AND table_schema = $2 ORDER BY ordinal_position";
                sqlx::query(query)
                    .bind(table_name)
                    .bind(database.clone().unwrap_or_else(|| "public".to_string()))
                    .fetch_all(&self.pool)
                    .await?
            }
            (Drivers::MySQL, None) => {
                let query = "SELECT column_name, column_type FROM information_schema.columns \
                             WHERE table_name = ? AND table_schema = DATABASE() ORDER BY ordinal_position";
                sqlx::query(query).bind(table_name).fetch_all(&self.pool).await?
            }
            (Drivers::MySQL, Some(database)) => {
                let query = "SELECT column_name, column_type FROM information_schema.columns \
                             WHERE table_name = ? AND table_schema = ? ORDER BY ordinal_position";
                sqlx::query(query).bind(table_name).bind(database).fetch_all(&self.pool).await?
            }
        };

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let column: (String, String) = if let Drivers::SQLite = self.driver {
                (row.try_get("name")?, row.try_get("type")?)
            } else {
                (row.try_get(0)?, row.try_get(1)?)
            };
            columns.push(column);
        }
        Ok(columns)
    }
}

#[async_trait]
impl SchemaIntrospector for Database {
    async fn list_columns(&self, table: &TableIdentity) -> Result<Vec<ColumnDescriptor>, Error> {
        let columns = self.list_table_columns(table).await?;
        log::trace!("Table `{}` has {} columns", table, columns.len());

        Ok(columns
            .into_iter()
            .map(|(name, sql_type)| ColumnDescriptor::new(name, SemanticType::from_sql_type(&sql_type)))
            .collect())
    }
}

// ============================================================================
// DatabaseBuilder Struct
// ============================================================================

pub struct DatabaseBuilder {
    max_connections: u32,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self { max_connections: 5 }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub async fn connect(self, url: &str) -> Result<Database, Error> {
        sqlx::any::install_default_drivers();
        let pool = sqlx::any::AnyPoolOptions::new().max_connections(self.max_connections).connect(url).await?;
        let driver = Drivers::from_url(url);
        log::debug!("Connected to {:?} database", driver);
        Ok(Database { pool, driver })
    }
}

// ============================================================================
// Raw SQL Statement
// ============================================================================

/// An ad-hoc SQL statement with bound arguments.
pub struct RawQuery<'a> {
    db: Database,
    sql: &'a str,
    args: AnyArguments<'a>,
    /// First argument that failed to encode.
    bind_error: Option<BoxDynError>,
}

impl<'a> RawQuery<'a> {
    pub(crate) fn new(db: Database, sql: &'a str) -> Self {
        Self { db, sql, args: AnyArguments::default(), bind_error: None }
    }

    pub fn bind<T>(mut self, value: T) -> Self
    where
        T: 'a + sqlx::Encode<'a, sqlx::Any> + sqlx::Type<sqlx::Any> + Send + Sync,
    {
        if let Err(err) = self.args.add(value) {
            self.bind_error.get_or_insert(err);
        }
        self
    }

    /// Executes the statement and returns the number of affected rows.
    ///
    /// Fails without touching the database if an argument could not be
    /// encoded.
    pub async fn execute(self) -> Result<u64, Error> {
        if let Some(err) = self.bind_error {
            return Err(Error::Database(sqlx::Error::Encode(err)));
        }
        let result = sqlx::query_with(self.sql, self.args).execute(&self.db.pool).await?;
        Ok(result.rows_affected())
    }
}
