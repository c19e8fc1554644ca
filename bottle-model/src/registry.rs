//! # Registry Module
//!
//! Process-wide caches keyed by model type: resolved cast configuration,
//! introspected columns and automatic casts.
//!
//! Caches fill lazily on first access per model and live until purged.
//! Concurrent first accesses may introspect more than once; the first
//! result stored wins and every caller gets that one.

// ============================================================================
// External Crate Imports
// ============================================================================

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::{any::TypeId, sync::Arc};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    cast::{resolve_casts, CastMap},
    config::{AutocastConfig, CastConfig},
    model::Model,
    schema::{ColumnDescriptor, SchemaIntrospector},
    Error, Result,
};

static GLOBAL: OnceCell<Arc<Registry>> = OnceCell::new();

/// Per-model caches and the process-wide autocast configuration.
#[derive(Debug, Default)]
pub struct Registry {
    config: AutocastConfig,
    cast_configs: DashMap<TypeId, Arc<CastConfig>>,
    columns: DashMap<TypeId, Arc<Vec<ColumnDescriptor>>>,
    auto_casts: DashMap<TypeId, Arc<CastMap>>,
}

impl Registry {
    pub fn new(config: AutocastConfig) -> Self {
        Self { config, ..Self::default() }
    }

    /// Installs the global registry. Must run before the first call to
    /// [`Registry::global`].
    pub fn init_global(config: AutocastConfig) -> Result<Arc<Registry>> {
        let registry = Arc::new(Registry::new(config));
        GLOBAL.set(registry.clone()).map_err(|_| Error::RegistryInitialized)?;
        Ok(registry)
    }

    /// The global registry, created with the default configuration if
    /// [`Registry::init_global`] was never called.
    pub fn global() -> Arc<Registry> {
        GLOBAL.get_or_init(|| Arc::new(Registry::default())).clone()
    }

    pub fn config(&self) -> &AutocastConfig {
        &self.config
    }

    /// The resolved cast configuration of `M`.
    pub fn cast_config<M: Model>(&self) -> Arc<CastConfig> {
        self.cast_configs
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Arc::new(CastConfig::resolve(&self.config, &M::autocast_overrides())))
            .clone()
    }

    /// The columns of `M`'s table, introspected on first access.
    pub async fn columns<M: Model>(&self, introspector: &dyn SchemaIntrospector) -> Result<Arc<Vec<ColumnDescriptor>>> {
        let id = TypeId::of::<M>();
        if let Some(cached) = self.columns.get(&id) {
            return Ok(cached.clone());
        }

        let table = M::table_identity();
        log::debug!("Introspecting columns of `{}` for {}", table, M::model_name());
        let columns = Arc::new(introspector.list_columns(&table).await?);

        Ok(self.columns.entry(id).or_insert(columns).clone())
    }

    /// The automatic casts of `M`, resolved once from its columns.
    pub async fn auto_casts<M: Model>(&self, introspector: &dyn SchemaIntrospector) -> Result<Arc<CastMap>> {
        let id = TypeId::of::<M>();
        if let Some(cached) = self.auto_casts.get(&id) {
            return Ok(cached.clone());
        }

        let columns = self.columns::<M>(introspector).await?;
        let casts = Arc::new(resolve_casts(columns.iter(), &self.cast_config::<M>()));
        log::debug!("Resolved {} automatic casts for {}", casts.len(), M::model_name());

        Ok(self.auto_casts.entry(id).or_insert(casts).clone())
    }

    /// Whether `M`'s columns are cached.
    pub fn is_cached<M: Model>(&self) -> bool {
        self.columns.contains_key(&TypeId::of::<M>())
    }

    /// Drops the cached columns and casts of `M`. Intended for test
    /// isolation; the next access introspects again.
    pub fn purge<M: Model>(&self) {
        let id = TypeId::of::<M>();
        self.columns.remove(&id);
        self.auto_casts.remove(&id);
        self.cast_configs.remove(&id);
    }

    pub fn purge_all(&self) {
        self.columns.clear();
        self.auto_casts.clear();
        self.cast_configs.clear();
    }
}
