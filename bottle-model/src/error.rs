//! # Error Module
//!
//! A single error type shared by every part of Bottle Model. Validation
//! failures are not errors: a rejected save is reported through
//! [`SaveOutcome`](crate::SaveOutcome).

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by Bottle Model.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema introspection query or the connection behind it failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A default value could not be turned into its storage text.
    #[error("failed to serialize default value for `{attribute}`: {source}")]
    Serialization {
        attribute: String,
        #[source]
        source: serde_json::Error,
    },

    /// A raw attribute value could not be converted by its cast directive.
    #[error("cannot cast `{attribute}` as {cast}: {reason}")]
    Cast { attribute: String, cast: String, reason: String },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration file is not valid TOML or has the wrong shape.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The store has no row for the requested key.
    #[error("no record in `{table}` with key {key}")]
    NotFound { table: String, key: String },

    /// A new record was saved under a primary key that is already taken.
    #[error("duplicate key {key} in `{table}`")]
    DuplicateKey { table: String, key: String },

    /// Failure reported by a [`Store`](crate::Store) implementation.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// [`Registry::init_global`](crate::Registry::init_global) was called twice.
    #[error("the global registry is already initialized")]
    RegistryInitialized,
}

impl Error {
    /// Wraps an arbitrary storage-layer error.
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Store(Box::new(err))
    }
}
