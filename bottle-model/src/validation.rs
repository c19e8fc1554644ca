//! # Validation Module
//!
//! The contract for the external validator that gates saves. This crate
//! does not interpret rules; it hands the record's unfiltered array form and
//! the model's rules to a [`Validator`] and acts on the verdict.

use std::collections::BTreeMap;

use crate::record::Attributes;

/// Validation rules keyed by attribute name, e.g. `"email" => ["required", "email"]`.
pub type Rules = BTreeMap<String, Vec<String>>;

/// Builds [`Rules`] from `(attribute, rules)` pairs.
///
/// ```rust
/// let rules = bottle_model::rules([("title", ["required", "max:255"])]);
/// assert_eq!(rules["title"], vec!["required", "max:255"]);
/// ```
pub fn rules<K, R, S>(entries: impl IntoIterator<Item = (K, R)>) -> Rules
where
    K: Into<String>,
    R: IntoIterator<Item = S>,
    S: Into<String>,
{
    entries
        .into_iter()
        .map(|(key, rules)| (key.into(), rules.into_iter().map(Into::into).collect()))
        .collect()
}

/// Outcome of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    /// A report without errors.
    pub fn passed() -> Self {
        Self::default()
    }

    /// Records an error message for an attribute.
    pub fn add_error(&mut self, attribute: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.entry(attribute.into()).or_default().push(message.into());
        self
    }

    pub fn with_error(mut self, attribute: impl Into<String>, message: impl Into<String>) -> Self {
        self.add_error(attribute, message);
        self
    }

    pub fn passes(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fails(&self) -> bool {
        !self.passes()
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }
}

/// Validates attribute data against rules.
///
/// Any `Fn(&Attributes, &Rules) -> ValidationReport` is a validator.
pub trait Validator: Send + Sync {
    fn validate(&self, data: &Attributes, rules: &Rules) -> ValidationReport;
}

impl<F> Validator for F
where
    F: Fn(&Attributes, &Rules) -> ValidationReport + Send + Sync,
{
    fn validate(&self, data: &Attributes, rules: &Rules) -> ValidationReport {
        self(data, rules)
    }
}
