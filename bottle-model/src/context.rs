//! # Context Module
//!
//! [`ModelContext`] ties a model's declarations to its collaborators: the
//! schema introspector its casts come from, the validator that gates saves
//! and the store saves are committed to.

// ============================================================================
// External Crate Imports
// ============================================================================

use std::sync::Arc;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    boot::Booter,
    cast::{merge_casts, CastMap},
    model::{Entity, Model},
    record::{Attributes, Record},
    registry::Registry,
    schema::{ColumnDescriptor, SchemaIntrospector},
    store::{PersistRequest, Store},
    validation::{ValidationReport, Validator},
    Result,
};

// ============================================================================
// Save Outcome
// ============================================================================

/// Result of [`ModelContext::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record was written and refreshed from the store.
    Saved,
    /// Validation failed; nothing was written and the record is unchanged.
    Rejected(ValidationReport),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

// ============================================================================
// Model Context
// ============================================================================

/// Entry point for cast resolution, validation and saving.
///
/// Cheap to clone; all collaborators are shared.
///
/// # Example
///
/// ```rust,ignore
/// let db = Database::connect("sqlite::memory:").await?;
/// let ctx = ModelContext::new(db, MemoryStore::new(), |_: &Attributes, _: &Rules| ValidationReport::passed());
///
/// let mut post = Record::<Post>::new()?;
/// post.set("title", "Hello");
/// assert!(ctx.save(&mut post).await?.is_saved());
/// ```
#[derive(Clone)]
pub struct ModelContext {
    registry: Arc<Registry>,
    introspector: Arc<dyn SchemaIntrospector>,
    store: Arc<dyn Store>,
    validator: Arc<dyn Validator>,
}

impl ModelContext {
    /// Creates a context backed by the global [`Registry`].
    pub fn new<I, S, V>(introspector: I, store: S, validator: V) -> Self
    where
        I: SchemaIntrospector + 'static,
        S: Store + 'static,
        V: Validator + 'static,
    {
        Self {
            registry: Registry::global(),
            introspector: Arc::new(introspector),
            store: Arc::new(store),
            validator: Arc::new(validator),
        }
    }

    /// Uses a specific registry instead of the global one.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns a Booter that warms the caches of registered models.
    pub fn booter(&self) -> Booter<'_> {
        Booter::new(self)
    }

    // ------------------------------------------------------------------------
    // Table introspection
    // ------------------------------------------------------------------------

    /// The columns of `M`'s table, cached after the first call.
    pub async fn columns<M: Model>(&self) -> Result<Arc<Vec<ColumnDescriptor>>> {
        self.registry.columns::<M>(self.introspector.as_ref()).await
    }

    /// One column of `M`'s table by name.
    pub async fn column<M: Model>(&self, name: &str) -> Result<Option<ColumnDescriptor>> {
        let columns = self.columns::<M>().await?;
        Ok(columns.iter().find(|column| column.name() == name).cloned())
    }

    pub async fn column_names<M: Model>(&self) -> Result<Vec<String>> {
        let columns = self.columns::<M>().await?;
        Ok(columns.iter().map(|column| column.name().to_string()).collect())
    }

    // ------------------------------------------------------------------------
    // Casting
    // ------------------------------------------------------------------------

    /// The effective casts of `M`: automatic casts with `M`'s manual casts
    /// merged over them. The automatic part is cached; the manual part is
    /// read on every call.
    pub async fn casts<M: Entity>(&self) -> Result<CastMap> {
        let auto = self.registry.auto_casts::<M>(self.introspector.as_ref()).await?;
        Ok(merge_casts(&auto, M::casts()))
    }

    /// The record's cast, visibility-filtered array form.
    pub async fn to_array<M: Entity>(&self, record: &Record<M>) -> Result<Attributes> {
        let casts = self.casts::<M>().await?;
        record.attributes_to_array(&casts)
    }

    // ------------------------------------------------------------------------
    // Validation & persistence
    // ------------------------------------------------------------------------

    /// Validates the record, hidden attributes included, against `M`'s rules.
    pub async fn validate<M: Entity>(&self, record: &mut Record<M>) -> Result<ValidationReport> {
        let casts = self.casts::<M>().await?;
        let data = record.validation_data(&casts)?;
        Ok(self.validator.validate(&data, &M::rules()))
    }

    /// Validates and saves the record.
    ///
    /// A failed validation is not an error: the record is left untouched and
    /// [`SaveOutcome::Rejected`] carries the report. After a successful
    /// write the record's attributes are replaced by what the store holds,
    /// picking up store-applied defaults and computed columns.
    pub async fn save<M: Entity>(&self, record: &mut Record<M>) -> Result<SaveOutcome> {
        let report = self.validate(record).await?;
        if report.fails() {
            log::debug!("Save of {} rejected by validation: {:?}", M::model_name(), report.errors());
            return Ok(SaveOutcome::Rejected(report));
        }

        let table = M::table_identity();
        let primary_key = M::primary_key_name();
        let key = self
            .store
            .persist(PersistRequest {
                table: &table,
                primary_key,
                attributes: record.attributes(),
                exists: record.exists(),
            })
            .await?;
        record.mark_persisted();

        let fresh = self.store.refresh(&table, primary_key, &key).await?;
        record.set_raw_attributes(fresh);

        log::debug!("Saved {} with key {}", M::model_name(), key);
        Ok(SaveOutcome::Saved)
    }
}
