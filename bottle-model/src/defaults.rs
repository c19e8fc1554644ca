//! # Defaults Module
//!
//! Declared default attributes and the operations that materialize, reset
//! and compare them.
//!
//! Defaults become a fresh record's raw attributes as-is, without going
//! through any cast. Composite values (lists, keyed mappings, serializable
//! structures) are therefore stored as their JSON text.

// ============================================================================
// External Crate Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;
use std::{fmt, sync::Arc};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{record::Attributes, Error, Result};

type Deferred = Arc<dyn Fn() -> serde_json::Result<String> + Send + Sync>;

// ============================================================================
// Default Value
// ============================================================================

/// A single declared default.
#[derive(Clone)]
pub enum DefaultValue {
    /// A JSON value. Arrays and objects are stored as JSON text.
    Value(Value),
    /// A structure serialized to JSON text when the defaults are materialized.
    Serialized(Deferred),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Serialized(_) => f.write_str("Serialized(..)"),
        }
    }
}

impl DefaultValue {
    fn materialize(&self, attribute: &str) -> Result<Value> {
        let serialization = |source| Error::Serialization { attribute: attribute.to_string(), source };

        match self {
            DefaultValue::Value(value @ (Value::Array(_) | Value::Object(_))) => {
                serde_json::to_string(value).map(Value::String).map_err(serialization)
            }
            DefaultValue::Value(scalar) => Ok(scalar.clone()),
            DefaultValue::Serialized(serialize) => serialize().map(Value::String).map_err(serialization),
        }
    }
}

// ============================================================================
// Default Spec
// ============================================================================

/// The default attributes of a model type, in declaration order.
///
/// # Example
///
/// ```rust
/// use bottle_model::DefaultSpec;
/// use serde_json::json;
///
/// let spec = DefaultSpec::new()
///     .with("status", "pending")
///     .with("tags", json!(["a", "b"]));
///
/// let attributes = spec.attributes().unwrap();
/// assert_eq!(attributes["tags"], json!("[\"a\",\"b\"]"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultSpec {
    entries: Vec<(String, DefaultValue)>,
}

impl DefaultSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a default. Declaring the same key again replaces it.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key.into(), DefaultValue::Value(value.into()));
        self
    }

    /// Declares a default that is serialized to JSON text on
    /// materialization. Serialization errors surface from
    /// [`DefaultSpec::attributes`].
    pub fn with_serialized<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        let deferred: Deferred = Arc::new(move || serde_json::to_string(&value));
        self.insert(key.into(), DefaultValue::Serialized(deferred));
        self
    }

    fn insert(&mut self, key: String, value: DefaultValue) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Materializes the defaults into storage form: composites become JSON
    /// text, scalars and null pass through unchanged.
    pub fn attributes(&self) -> Result<Attributes> {
        let mut attributes = Attributes::new();
        for (key, value) in &self.entries {
            attributes.insert(key.clone(), value.materialize(key)?);
        }
        Ok(attributes)
    }

    /// Materialized default for one attribute.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.entries.iter().find(|(existing, _)| existing == key) {
            Some((key, value)) => value.materialize(key).map(Some),
            None => Ok(None),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for DefaultSpec
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(DefaultSpec::new(), |spec, (key, value)| spec.with(key, value))
    }
}

// ============================================================================
// Attribute Operations
// ============================================================================

/// Attributes after a reset to `defaults`.
///
/// With `preserve_extra`, attributes that have no default are kept and
/// every default key is forced back to its default. Without it, the result
/// is exactly the defaults.
pub fn reset_attributes(current: &Attributes, defaults: Attributes, preserve_extra: bool) -> Attributes {
    if !preserve_extra {
        return defaults;
    }

    let mut merged = current.clone();
    merged.extend(defaults);
    merged
}

/// True when every attribute matches its default under [`loosely_equal`].
///
/// Attributes without a default are skipped when `ignore_extra` is set and
/// fail the check otherwise.
pub fn matches_defaults(current: &Attributes, defaults: &Attributes, ignore_extra: bool) -> bool {
    current.iter().all(|(key, value)| match defaults.get(key) {
        Some(default) => loosely_equal(value, default),
        None => ignore_extra,
    })
}

// ============================================================================
// Loose Equality
// ============================================================================

/// Compares two raw attribute values, coercing between numbers, numeric
/// strings, booleans and null.
///
/// Rules, in order:
///
/// 1. Values of the same JSON type compare strictly, except that two
///    numbers compare numerically (`1 == 1.0`) and two numeric strings
///    compare numerically (`"10" == "1e1"`).
/// 2. A boolean compares against the truthiness of the other side (`0`,
///    `""`, `"0"`, null and empty composites are false).
/// 3. Null equals `""`. Null against a number is `false`.
/// 4. A number equals a string only when the string is numeric and has the
///    same value (`0 == "0"`, `5 == " 5 "`, `0 != "a"`). Surrounding
///    whitespace is ignored when deciding whether a string is numeric.
/// 5. Anything else is unequal.
pub fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Bool(b), other) | (other, Value::Bool(b)) => *b == crate::cast::truthy(other),
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            numeric(s).is_some_and(|parsed| n.as_f64() == Some(parsed))
        }
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => left == right,
        _ => false,
    }
}

fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => a.as_f64() == b.as_f64(),
    }
}

fn numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}
