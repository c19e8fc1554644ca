//! # Store Module
//!
//! The storage contract a validated save is committed through, and an
//! in-process [`MemoryStore`] implementation.

// ============================================================================
// External Crate Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tokio::sync::Mutex;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{record::Attributes, schema::TableIdentity, Error, Result};

// ============================================================================
// Store Trait
// ============================================================================

/// A record about to be written.
#[derive(Debug, Clone, Copy)]
pub struct PersistRequest<'a> {
    pub table: &'a TableIdentity,
    pub primary_key: &'a str,
    /// Raw attributes, including the primary key when it is already set.
    pub attributes: &'a Attributes,
    /// Whether the record was persisted before.
    pub exists: bool,
}

/// Durable storage for records.
///
/// Errors are returned to the caller of
/// [`ModelContext::save`](crate::ModelContext::save) unchanged.
#[async_trait]
pub trait Store: Send + Sync {
    /// Writes the record and returns its primary key value.
    async fn persist(&self, request: PersistRequest<'_>) -> Result<Value>;

    /// Reads back every attribute of the row with the given key.
    async fn refresh(&self, table: &TableIdentity, primary_key: &str, key: &Value) -> Result<Attributes>;
}

// ============================================================================
// Memory Store
// ============================================================================

#[derive(Debug, Default)]
struct TableState {
    /// Rows keyed by the JSON text of their primary key, so `1` and `"1"`
    /// are different rows.
    rows: BTreeMap<String, Attributes>,
    column_defaults: Attributes,
    next_id: i64,
}

/// An in-process [`Store`].
///
/// Rows without a primary key get an auto-incremented integer key that
/// never reuses an integer or numeric-string key already written. Column
/// defaults registered with [`MemoryStore::with_column_default`] are applied
/// to inserted rows that lack the attribute, the way a database applies
/// `DEFAULT` clauses. Inserting a new record under a key that is already
/// taken fails with [`Error::DuplicateKey`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, TableState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a value the store fills in on insert when it is missing.
    pub async fn with_column_default(
        self,
        table: impl Into<TableIdentity>,
        column: &str,
        value: impl Into<Value>,
    ) -> Self {
        {
            let mut tables = self.tables.lock().await;
            tables
                .entry(table.into().qualified_name())
                .or_default()
                .column_defaults
                .insert(column.to_string(), value.into());
        }
        self
    }

    /// A stored row, if any.
    pub async fn row(&self, table: impl Into<TableIdentity>, key: &Value) -> Option<Attributes> {
        let tables = self.tables.lock().await;
        tables.get(&table.into().qualified_name()).and_then(|state| state.rows.get(&row_key(key)).cloned())
    }

    pub async fn row_count(&self, table: impl Into<TableIdentity>) -> usize {
        let tables = self.tables.lock().await;
        tables.get(&table.into().qualified_name()).map_or(0, |state| state.rows.len())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn persist(&self, request: PersistRequest<'_>) -> Result<Value> {
        let mut tables = self.tables.lock().await;
        let state = tables.entry(request.table.qualified_name()).or_default();

        let mut row = request.attributes.clone();
        let key = match row.get(request.primary_key).filter(|key| !key.is_null()) {
            Some(key) => key.clone(),
            None => {
                state.next_id += 1;
                let key = Value::from(state.next_id);
                row.insert(request.primary_key.to_string(), key.clone());
                key
            }
        };
        if let Some(id) = integer_key(&key) {
            state.next_id = state.next_id.max(id);
        }

        let key_text = row_key(&key);
        let inserting = !state.rows.contains_key(&key_text);
        if !request.exists && !inserting {
            return Err(Error::DuplicateKey { table: request.table.qualified_name(), key: key_text });
        }
        if inserting {
            for (column, default) in &state.column_defaults {
                if !row.contains_key(column) {
                    row.insert(column.clone(), default.clone());
                }
            }
        }

        log::trace!("Persisting row {} into `{}`", key_text, request.table);
        state.rows.entry(key_text).or_default().extend(row);
        Ok(key)
    }

    async fn refresh(&self, table: &TableIdentity, _primary_key: &str, key: &Value) -> Result<Attributes> {
        let tables = self.tables.lock().await;
        tables
            .get(&table.qualified_name())
            .and_then(|state| state.rows.get(&row_key(key)))
            .cloned()
            .ok_or_else(|| Error::NotFound { table: table.qualified_name(), key: row_key(key) })
    }
}

fn row_key(key: &Value) -> String {
    key.to_string()
}

/// Integer value of a numeric or numeric-string key.
fn integer_key(key: &Value) -> Option<i64> {
    match key {
        Value::Number(n) => n.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
