//! # Cast Module
//!
//! Cast directives describe how a raw stored value becomes an
//! application-level value. This module derives them from introspected
//! column types and applies them to raw attribute values.

// ============================================================================
// External Crate Imports
// ============================================================================

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::{Number, Value};
use std::{collections::BTreeMap, fmt, fmt::Write};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    config::{CastConfig, CastTarget},
    schema::{ColumnDescriptor, SemanticType},
    Error, Result,
};

/// Cast directives keyed by attribute name.
pub type CastMap = BTreeMap<String, CastDirective>;

// ============================================================================
// Cast Directive
// ============================================================================

/// How a raw stored value is converted to an application-level value.
///
/// A column without a directive is left as stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CastDirective {
    Integer,
    Boolean,
    Float,
    ArrayAs(CastTarget),
    JsonAs(CastTarget),
    DateTimeWithFormat(String),
    DateWithFormat(String),
    TimeWithFormat(String),
    /// Cast understood by the application but not by this crate. Only ever
    /// produced by manual overrides; the value passes through unchanged.
    Custom(String),
}

impl fmt::Display for CastDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastDirective::Integer => f.write_str("integer"),
            CastDirective::Boolean => f.write_str("bool"),
            CastDirective::Float => f.write_str("float"),
            CastDirective::ArrayAs(target) | CastDirective::JsonAs(target) => f.write_str(target.as_str()),
            CastDirective::DateTimeWithFormat(format) => write!(f, "datetime:{}", format),
            CastDirective::DateWithFormat(format) => write!(f, "date:{}", format),
            // Time columns keep the datetime cast kind in their string form.
            CastDirective::TimeWithFormat(format) => write!(f, "datetime:{}", format),
            CastDirective::Custom(cast) => f.write_str(cast),
        }
    }
}

impl CastDirective {
    /// Looks up the directive for a semantic type. `None` means the column
    /// gets no automatic cast.
    pub fn for_semantic_type(semantic_type: SemanticType, config: &CastConfig) -> Option<Self> {
        use SemanticType::*;

        let directive = match semantic_type {
            Array | SimpleArray => CastDirective::ArrayAs(config.array_cast_target),
            Json => CastDirective::JsonAs(config.json_cast_target),
            BigInt | Integer | SmallInt => CastDirective::Integer,
            Boolean => CastDirective::Boolean,
            DateTimeMutable | DateTimeTzMutable | DateTimeTzImmutable => {
                CastDirective::DateTimeWithFormat(config.datetime_format.clone())
            }
            TimeMutable | TimeImmutable => CastDirective::TimeWithFormat(config.time_format.clone()),
            DateMutable | DateImmutable => CastDirective::DateWithFormat(config.date_format.clone()),
            Decimal | Float => CastDirective::Float,
            DateTimeImmutable | String | Text | Binary | Guid | Unknown => return None,
        };

        Some(directive)
    }

    /// Converts a raw stored value. `Null` is never cast.
    ///
    /// Numeric and JSON directives never fail: a value they cannot convert
    /// is returned unchanged, leaving the verdict to validation. Only
    /// unparseable date/time values are errors.
    pub fn apply(&self, attribute: &str, raw: &Value) -> Result<Value> {
        if raw.is_null() {
            return Ok(Value::Null);
        }

        let fail = |reason: String| Error::Cast {
            attribute: attribute.to_string(),
            cast: self.to_string(),
            reason,
        };

        match self {
            CastDirective::Integer => Ok(to_integer(raw).map(Value::from).unwrap_or_else(|| raw.clone())),
            CastDirective::Float => Ok(to_float(raw)
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| raw.clone())),
            CastDirective::Boolean => Ok(Value::Bool(truthy(raw))),
            CastDirective::ArrayAs(_) | CastDirective::JsonAs(_) => match raw {
                Value::String(text) => Ok(serde_json::from_str(text).unwrap_or_else(|_| raw.clone())),
                _ => Ok(raw.clone()),
            },
            CastDirective::DateTimeWithFormat(format)
            | CastDirective::DateWithFormat(format)
            | CastDirective::TimeWithFormat(format) => {
                let text = raw.as_str().ok_or_else(|| fail(format!("{} is not a string", raw)))?;
                let parsed = parse_temporal(text).ok_or_else(|| fail(format!("unrecognized date/time `{}`", text)))?;
                let parsed = match self {
                    CastDirective::DateWithFormat(_) => start_of_day(parsed),
                    _ => parsed,
                };

                let mut rendered = String::new();
                write!(rendered, "{}", parsed.format(format)).map_err(|_| fail(format!("invalid format `{}`", format)))?;
                Ok(Value::String(rendered))
            }
            CastDirective::Custom(_) => Ok(raw.clone()),
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Derives automatic casts for a table's columns. Columns whose semantic
/// type has no directive get no entry.
pub fn resolve_casts<'a, I>(columns: I, config: &CastConfig) -> CastMap
where
    I: IntoIterator<Item = &'a ColumnDescriptor>,
{
    columns
        .into_iter()
        .filter_map(|column| {
            CastDirective::for_semantic_type(column.semantic_type(), config).map(|cast| (column.name().to_string(), cast))
        })
        .collect()
}

/// Merges manual casts over automatic ones; manual entries win.
pub fn merge_casts(auto: &CastMap, manual: CastMap) -> CastMap {
    let mut merged = auto.clone();
    merged.extend(manual);
    merged
}

// ============================================================================
// Value Helpers
// ============================================================================

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Accepts RFC 3339 and the common SQL renderings. Naive values are UTC.
fn parse_temporal(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    let utc = |naive: NaiveDateTime| Utc.from_utc_datetime(&naive).fixed_offset();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed);
    }
    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(parsed);
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(utc(naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(utc(date.and_time(NaiveTime::MIN)));
    }
    for pattern in ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"] {
        if let Ok(time) = NaiveTime::parse_from_str(text, pattern) {
            return Some(utc(NaiveDate::default().and_time(time)));
        }
    }
    None
}

fn start_of_day(value: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let offset = *value.offset();
    let midnight = value.date_naive().and_time(NaiveTime::MIN);
    offset.from_local_datetime(&midnight).single().unwrap_or(value)
}
