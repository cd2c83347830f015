//! Explicit model configuration.
//!
//! A [`ModelSchema`] names the collection a model maps to, its primary key, which
//! attributes go through a caster and which attributes hold dates. Every
//! [`Model`](crate::model::Model) holds its schema from construction onwards; nothing is
//! discovered at runtime.
//!
//! Schemas can be built in code, derived with `#[derive(Model)]` from the `docmap` crate,
//! or loaded from JSON:
//!
//! ```ignore
//! let schema = ModelSchema::from_json(r#"{
//!     "name": "Soft",
//!     "collection": "soft",
//!     "dates": ["deleted_at"]
//! }"#)?;
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{cast::CasterKind, error::ModelResult};

/// Default primary key of every document.
pub const DEFAULT_PRIMARY_KEY: &str = "_id";

/// Default format used to compare date attributes.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Attribute-level mapping configuration for one model type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSchema {
    /// Model name, used to derive foreign key names.
    pub name: String,
    /// Collection the model's documents live in.
    pub collection: String,
    /// Name of the primary key attribute.
    pub primary_key: String,
    /// Casters by attribute name.
    pub casts: BTreeMap<String, CasterKind>,
    /// Attributes holding dates.
    pub dates: BTreeSet<String>,
    /// `chrono` format string producing the canonical date string.
    pub date_format: String,
}

impl Default for ModelSchema {
    fn default() -> Self {
        Self {
            name: String::new(),
            collection: String::new(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            casts: BTreeMap::from([(DEFAULT_PRIMARY_KEY.to_string(), CasterKind::ObjectId)]),
            dates: BTreeSet::new(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl ModelSchema {
    /// Creates a schema for `collection` with an object id primary key named `_id`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Parses a schema from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Renames the primary key. A cast registered on the previous key moves with it.
    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();

        if let Some(kind) = self.casts.remove(&self.primary_key) {
            self.casts.insert(key.clone(), kind);
        }
        self.primary_key = key;
        self
    }

    pub fn cast(mut self, attribute: impl Into<String>, kind: CasterKind) -> Self {
        self.casts.insert(attribute.into(), kind);
        self
    }

    pub fn without_cast(mut self, attribute: &str) -> Self {
        self.casts.remove(attribute);
        self
    }

    pub fn date(mut self, attribute: impl Into<String>) -> Self {
        self.dates.insert(attribute.into());
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Returns the caster registered for `attribute`.
    pub fn caster(&self, attribute: &str) -> Option<CasterKind> {
        self.casts.get(attribute).copied()
    }

    /// Whether `attribute` is a date attribute, either listed in `dates` or cast as a timestamp.
    pub fn is_date(&self, attribute: &str) -> bool {
        self.dates.contains(attribute) || self.caster(attribute) == Some(CasterKind::DateTime)
    }

    /// Default foreign key other models use to reference this one, e.g. `user_id`.
    pub fn foreign_key(&self) -> String {
        format!(
            "{}_{}",
            snake_case(&self.name),
            self.primary_key.trim_start_matches('_')
        )
    }
}

/// Declares the schema of a model type.
///
/// Usually implemented through `#[derive(Model)]`.
pub trait ModelDefinition {
    fn schema() -> ModelSchema;
}

/// Converts `CamelCase` to `snake_case`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);

    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
