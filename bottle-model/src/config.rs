//! # Configuration Module
//!
//! Process-wide autocasting settings, per-model overrides and the resolved
//! [`CastConfig`] a model's casts are computed from.
//!
//! The process-wide settings are read from TOML:
//!
//! ```toml
//! [autocasting]
//! arrays = "array"   # "array" or "object"
//! json = "array"     # "array" or "object"
//!
//! [autocasting.formats]
//! datetime = "%Y-%m-%dT%H:%M:%S%:z"
//! date = "%Y-%m-%d"
//! time = "%H:%M:%S"
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{Error, Result};

// ============================================================================
// Built-in Fallbacks
// ============================================================================

/// ATOM (RFC 3339) date-time format.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

// ============================================================================
// Cast Target
// ============================================================================

/// Shape a decoded array or JSON column is exposed as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastTarget {
    /// A list or keyed mapping.
    #[default]
    Array,
    /// A structured object.
    Object,
}

impl CastTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            CastTarget::Array => "array",
            CastTarget::Object => "object",
        }
    }
}

impl fmt::Display for CastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CastTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "array" => Ok(CastTarget::Array),
            "object" => Ok(CastTarget::Object),
            other => Err(Error::Config(format!("unknown cast target `{}`, expected `array` or `object`", other))),
        }
    }
}

// ============================================================================
// Process-wide Configuration
// ============================================================================

/// Format patterns for temporal casts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub datetime: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Process-wide autocasting settings. Unset fields fall back to the
/// built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocastConfig {
    pub arrays: Option<CastTarget>,
    pub json: Option<CastTarget>,
    pub formats: FormatConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    autocasting: AutocastConfig,
}

impl AutocastConfig {
    /// Parses the `[autocasting]` table of a TOML document. A document
    /// without that table yields the default configuration.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(source)?;
        log::debug!("Loaded autocasting configuration: {:?}", file.autocasting);
        Ok(file.autocasting)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }
}

// ============================================================================
// Per-model Overrides
// ============================================================================

/// Autocasting settings declared by a single model type.
///
/// Usually generated by `#[derive(Model)]` from the `autocast_*` keys of the
/// `#[model(...)]` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CastOverrides {
    pub autocast_array_to: Option<CastTarget>,
    pub autocast_json_to: Option<CastTarget>,
    pub autocast_datetime_format: Option<String>,
    pub autocast_date_format: Option<String>,
    pub autocast_time_format: Option<String>,
}

// ============================================================================
// Resolved Configuration
// ============================================================================

/// Fully resolved autocasting settings for one model type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastConfig {
    pub array_cast_target: CastTarget,
    pub json_cast_target: CastTarget,
    pub datetime_format: String,
    pub date_format: String,
    pub time_format: String,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self::resolve(&AutocastConfig::default(), &CastOverrides::default())
    }
}

impl CastConfig {
    /// Merges, field by field, the model's overrides over the process-wide
    /// settings over the built-in defaults.
    pub fn resolve(global: &AutocastConfig, overrides: &CastOverrides) -> Self {
        let pick = |local: &Option<String>, shared: &Option<String>, fallback: &str| {
            local.clone().or_else(|| shared.clone()).unwrap_or_else(|| fallback.to_string())
        };

        Self {
            array_cast_target: overrides.autocast_array_to.or(global.arrays).unwrap_or_default(),
            json_cast_target: overrides.autocast_json_to.or(global.json).unwrap_or_default(),
            datetime_format: pick(&overrides.autocast_datetime_format, &global.formats.datetime, DEFAULT_DATETIME_FORMAT),
            date_format: pick(&overrides.autocast_date_format, &global.formats.date, DEFAULT_DATE_FORMAT),
            time_format: pick(&overrides.autocast_time_format, &global.formats.time, DEFAULT_TIME_FORMAT),
        }
    }
}
