//! # Record Module
//!
//! A [`Record`] is one live instance of a model type: a dynamic mapping of
//! attribute name to raw stored value, plus the per-instance visibility
//! filters used when the record is turned into an array.

// ============================================================================
// External Crate Imports
// ============================================================================

use serde_json::Value;
use std::{fmt, marker::PhantomData, ops::Deref};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    cast::CastMap,
    defaults::{matches_defaults, reset_attributes},
    model::Entity,
    Result,
};

/// Raw attribute values keyed by attribute name.
pub type Attributes = serde_json::Map<String, Value>;

// ============================================================================
// Record Struct
// ============================================================================

/// One instance of model `M`.
///
/// Records are not synchronized; share one across threads only behind
/// external locking.
pub struct Record<M> {
    attributes: Attributes,
    hidden: Vec<String>,
    visible: Vec<String>,
    exists: bool,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Record<M> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            hidden: self.hidden.clone(),
            visible: self.visible.clone(),
            exists: self.exists,
            _model: PhantomData,
        }
    }
}

impl<M> PartialEq for Record<M> {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
            && self.hidden == other.hidden
            && self.visible == other.visible
            && self.exists == other.exists
    }
}

impl<M> fmt::Debug for Record<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &std::any::type_name::<M>())
            .field("attributes", &self.attributes)
            .field("exists", &self.exists)
            .finish()
    }
}

impl<M: Entity> Record<M> {
    /// Creates a record holding the model's default attributes.
    ///
    /// Fails when a default cannot be serialized.
    pub fn new() -> Result<Self> {
        let mut record = Self {
            attributes: Attributes::new(),
            hidden: M::hidden().into_iter().map(String::from).collect(),
            visible: M::visible().into_iter().map(String::from).collect(),
            exists: false,
            _model: PhantomData,
        };
        record.initialize_defaults()?;
        Ok(record)
    }

    /// Replaces the entire attribute set with the materialized defaults.
    pub fn initialize_defaults(&mut self) -> Result<()> {
        self.attributes = M::defaults().attributes()?;
        Ok(())
    }

    /// The materialized default attributes of `M`.
    pub fn default_attributes() -> Result<Attributes> {
        M::defaults().attributes()
    }

    /// The materialized default for one attribute, `None` when it has none.
    pub fn get_default(attribute: &str) -> Result<Option<Value>> {
        M::defaults().get(attribute)
    }

    /// Resets the record to its defaults.
    ///
    /// With `preserve_extra`, attributes that have no default are kept.
    pub fn reset_to_default(&mut self, preserve_extra: bool) -> Result<&mut Self> {
        let defaults = M::defaults().attributes()?;
        self.attributes = reset_attributes(&self.attributes, defaults, preserve_extra);
        Ok(self)
    }

    /// True when every attribute loosely equals its default.
    ///
    /// Attributes without a default are skipped when `ignore_extra` is set
    /// and make the check fail otherwise.
    pub fn is_default(&self, ignore_extra: bool) -> Result<bool> {
        let defaults = M::defaults().attributes()?;
        Ok(matches_defaults(&self.attributes, &defaults, ignore_extra))
    }
}

impl<M> Record<M> {
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.attributes.remove(attribute)
    }

    /// Replaces the attribute set without casting.
    pub fn set_raw_attributes(&mut self, attributes: Attributes) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Whether the record has been persisted.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.exists = true;
    }

    pub fn hidden(&self) -> &[String] {
        &self.hidden
    }

    pub fn visible(&self) -> &[String] {
        &self.visible
    }

    pub fn set_hidden(&mut self, hidden: Vec<String>) -> &mut Self {
        self.hidden = hidden;
        self
    }

    pub fn set_visible(&mut self, visible: Vec<String>) -> &mut Self {
        self.visible = visible;
        self
    }

    /// The attributes as exposed to the application: filtered by the
    /// visible list (when non-empty), then by the hidden list, and cast.
    pub fn attributes_to_array(&self, casts: &CastMap) -> Result<Attributes> {
        let mut array = Attributes::new();
        for (key, raw) in &self.attributes {
            if !self.visible.is_empty() && !self.visible.contains(key) {
                continue;
            }
            if self.hidden.contains(key) {
                continue;
            }

            let value = match casts.get(key) {
                Some(cast) => cast.apply(key, raw)?,
                None => raw.clone(),
            };
            array.insert(key.clone(), value);
        }
        Ok(array)
    }

    /// [`attributes_to_array`](Record::attributes_to_array) with the
    /// visibility filters lifted, so hidden attributes are included. The
    /// filters are restored afterwards, including on error.
    pub fn validation_data(&mut self, casts: &CastMap) -> Result<Attributes> {
        let unfiltered = Unfiltered::enter(self);
        unfiltered.attributes_to_array(casts)
    }
}

// ============================================================================
// Visibility Scope
// ============================================================================

/// Clears a record's visibility filters until dropped.
struct Unfiltered<'a, M> {
    record: &'a mut Record<M>,
    hidden: Vec<String>,
    visible: Vec<String>,
}

impl<'a, M> Unfiltered<'a, M> {
    fn enter(record: &'a mut Record<M>) -> Self {
        let hidden = std::mem::take(&mut record.hidden);
        let visible = std::mem::take(&mut record.visible);
        Self { record, hidden, visible }
    }
}

impl<M> Deref for Unfiltered<'_, M> {
    type Target = Record<M>;

    fn deref(&self) -> &Self::Target {
        &*self.record
    }
}

impl<M> Drop for Unfiltered<'_, M> {
    fn drop(&mut self) {
        self.record.hidden = std::mem::take(&mut self.hidden);
        self.record.visible = std::mem::take(&mut self.visible);
    }
}
