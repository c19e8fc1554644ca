//! # Schema Module
//!
//! Column metadata as seen by a schema introspector, and the
//! [`SchemaIntrospector`] contract that supplies it.

// ============================================================================
// External Crate Imports
// ============================================================================

use async_trait::async_trait;
use std::fmt;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::Result;

// ============================================================================
// Semantic Type
// ============================================================================

/// Storage-independent classification of a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Integer,
    BigInt,
    SmallInt,
    Boolean,
    DateTimeMutable,
    DateTimeImmutable,
    DateTimeTzMutable,
    DateTimeTzImmutable,
    DateMutable,
    DateImmutable,
    TimeMutable,
    TimeImmutable,
    Decimal,
    Float,
    Json,
    /// Serialized array stored in a single column.
    Array,
    /// Comma separated list stored in a single column.
    SimpleArray,
    String,
    Text,
    Binary,
    Guid,
    Unknown,
}

impl SemanticType {
    /// Classifies a storage-layer type name as reported by the database.
    ///
    /// Length and precision suffixes are ignored (`DECIMAL(10,2)` is a
    /// `Decimal`), except for MySQL's `tinyint(1)` which is a boolean.
    /// Names that are not recognized map to [`SemanticType::Unknown`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use bottle_model::SemanticType;
    ///
    /// assert_eq!(SemanticType::from_sql_type("BIGINT"), SemanticType::BigInt);
    /// assert_eq!(SemanticType::from_sql_type("timestamp with time zone"), SemanticType::DateTimeTzMutable);
    /// assert_eq!(SemanticType::from_sql_type("geometry"), SemanticType::Unknown);
    /// ```
    pub fn from_sql_type(sql_type: &str) -> Self {
        let lowered = sql_type.trim().to_ascii_lowercase();

        if lowered.starts_with("tinyint(1)") {
            return SemanticType::Boolean;
        }
        if lowered.ends_with("[]") || lowered == "array" {
            return SemanticType::Array;
        }

        let base = lowered.split('(').next().unwrap_or_default();
        let base = base.trim_end_matches(" unsigned").trim();

        match base {
            "bigint" | "int8" | "bigserial" => SemanticType::BigInt,
            "integer" | "int" | "int4" | "serial" | "mediumint" => SemanticType::Integer,
            "smallint" | "int2" | "smallserial" | "tinyint" => SemanticType::SmallInt,
            "boolean" | "bool" | "bit" => SemanticType::Boolean,
            "datetime" | "timestamp" | "timestamp without time zone" => SemanticType::DateTimeMutable,
            "timestamptz" | "timestamp with time zone" | "datetimetz" => SemanticType::DateTimeTzMutable,
            "date" => SemanticType::DateMutable,
            "time" | "time without time zone" | "timetz" | "time with time zone" => SemanticType::TimeMutable,
            "decimal" | "numeric" | "money" => SemanticType::Decimal,
            "float" | "float4" | "float8" | "double" | "double precision" | "real" => SemanticType::Float,
            "json" | "jsonb" => SemanticType::Json,
            "varchar" | "character varying" | "char" | "character" | "nvarchar" | "nchar" => SemanticType::String,
            "text" | "tinytext" | "mediumtext" | "longtext" | "clob" => SemanticType::Text,
            "blob" | "bytea" | "binary" | "varbinary" | "longblob" | "mediumblob" => SemanticType::Binary,
            "uuid" | "uniqueidentifier" => SemanticType::Guid,
            _ => SemanticType::Unknown,
        }
    }
}

// ============================================================================
// Column Descriptor
// ============================================================================

/// One column of a backing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    name: String,
    semantic_type: SemanticType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self { name: name.into(), semantic_type }
    }

    /// The column name, unique within its table.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }
}

// ============================================================================
// Table Identity
// ============================================================================

/// Names the table that backs a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdentity {
    /// Connection name, `None` for the default connection.
    pub connection: Option<String>,
    /// Database (schema) name, `None` for the connection's default database.
    pub database: Option<String>,
    pub table: String,
}

impl TableIdentity {
    pub fn new(table: impl Into<String>) -> Self {
        Self { connection: None, database: None, table: table.into() }
    }

    /// `database.table` when a database is set, otherwise the bare table name.
    pub fn qualified_name(&self) -> String {
        match &self.database {
            Some(database) => format!("{}.{}", database, self.table),
            None => self.table.clone(),
        }
    }
}

impl From<&str> for TableIdentity {
    fn from(table: &str) -> Self {
        Self::new(table)
    }
}

impl From<&TableIdentity> for TableIdentity {
    fn from(table: &TableIdentity) -> Self {
        table.clone()
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

// ============================================================================
// Schema Introspector Trait
// ============================================================================

/// Supplies the column metadata of a table.
///
/// Implementations perform I/O and may fail; failures propagate to the
/// caller unchanged and are never retried by this crate.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Lists the table's columns in the order the database reports them.
    async fn list_columns(&self, table: &TableIdentity) -> Result<Vec<ColumnDescriptor>>;
}
