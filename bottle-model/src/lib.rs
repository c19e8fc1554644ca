//! # Bottle Model
//!
//! Model attribute handling for Bottle ORM:
//!
//! - **Automatic casting**: cast directives derived from the introspected
//!   column types of a model's table, with manual casts taking precedence.
//! - **Default attributes**: declared defaults materialized into fresh
//!   records, with reset and comparison helpers.
//! - **Validated saves**: a record is validated before it is written and
//!   refreshed from the store afterwards.
//!
//! ```rust,ignore
//! use bottle_model::{DefaultSpec, HasCasts, HasDefaults, HasValidation, Model, Record, Rules};
//!
//! #[derive(Model)]
//! #[model(autocast_json_to = "object")]
//! struct Post;
//!
//! impl HasDefaults for Post {
//!     fn defaults() -> DefaultSpec {
//!         DefaultSpec::new().with("status", "draft")
//!     }
//! }
//! impl HasCasts for Post {}
//! impl HasValidation for Post {
//!     fn rules() -> Rules {
//!         bottle_model::rules([("title", ["required"])])
//!     }
//! }
//!
//! let post = Record::<Post>::new()?;
//! assert!(post.is_default(true)?);
//! ```

pub mod boot;
pub mod cast;
pub mod config;
pub mod context;
pub mod database;
pub mod defaults;
pub mod error;
pub mod model;
pub mod record;
pub mod registry;
pub mod schema;
pub mod store;
pub mod validation;

pub use bottle_model_macro::Model;

pub use boot::Booter;
pub use cast::{merge_casts, resolve_casts, CastDirective, CastMap};
pub use config::{AutocastConfig, CastConfig, CastOverrides, CastTarget, FormatConfig};
pub use context::{ModelContext, SaveOutcome};
pub use database::{Database, DatabaseBuilder, Drivers};
pub use defaults::{loosely_equal, DefaultSpec, DefaultValue};
pub use error::{Error, Result};
pub use model::{table_name_for, Entity, HasCasts, HasDefaults, HasValidation, Model};
pub use record::{Attributes, Record};
pub use registry::Registry;
pub use schema::{ColumnDescriptor, SchemaIntrospector, SemanticType, TableIdentity};
pub use store::{MemoryStore, PersistRequest, Store};
pub use validation::{rules, Rules, ValidationReport, Validator};
