//! Model instances: an attribute store, a snapshot store and the schema they follow.
//!
//! The attribute store holds the current stored form of every attribute. The snapshot
//! ("original") store holds the last values known to match the persisted document.
//! Right after hydration, or after an attribute is synchronized, both agree for that
//! attribute.
//!
//! Code that only needs the two stores should depend on [`HasAttributes`]; persistence
//! paths depend on [`Keyed`]. [`Model`] implements both.

use bson::{Bson, Document};
use std::sync::Arc;

use crate::{
    backend::DocumentKey,
    date::as_date_time,
    equivalence,
    error::{ModelError, ModelResult},
    mutation,
    schema::{ModelDefinition, ModelSchema},
    value::Value,
};

/// Access to an attribute store and its snapshot store.
pub trait HasAttributes {
    fn attributes(&self) -> &Document;

    fn attributes_mut(&mut self) -> &mut Document;

    fn original_attributes(&self) -> &Document;

    /// Copies the current value of `key` into the snapshot store, removing it from the
    /// snapshot when the attribute is absent.
    fn sync_original_attribute(&mut self, key: &str);
}

/// Access to the primary key of a persisted document.
pub trait Keyed {
    fn key_name(&self) -> &str;

    fn key(&self) -> Option<&Bson>;

    /// Returns the key addressing this model's document in the store.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingKey`] when the key is absent or null.
    fn document_key(&self) -> ModelResult<DocumentKey> {
        match self.key() {
            Some(value) if *value != Bson::Null => Ok(DocumentKey::new(self.key_name(), value.clone())),
            _ => Err(ModelError::MissingKey(self.key_name().to_string())),
        }
    }
}

/// A single model instance mapped onto one document.
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<ModelSchema>,
    attributes: Document,
    original: Document,
    exists: bool,
}

impl Model {
    /// Creates an empty, not yet persisted model.
    pub fn new(schema: Arc<ModelSchema>) -> Self {
        Self {
            schema,
            attributes: Document::new(),
            original: Document::new(),
            exists: false,
        }
    }

    /// Creates an empty model for a declared model type.
    pub fn of<D: ModelDefinition>() -> Self {
        Self::new(Arc::new(D::schema()))
    }

    /// Builds a persisted model whose snapshot equals `attributes`.
    pub(crate) fn from_stored(schema: Arc<ModelSchema>, attributes: Document) -> Self {
        Self {
            schema,
            original: attributes.clone(),
            attributes,
            exists: true,
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn collection(&self) -> &str {
        &self.schema.collection
    }

    /// Whether the model was loaded from, or saved to, the store.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub(crate) fn mark_exists(&mut self) {
        self.exists = true;
    }

    /// Returns the `id` attribute when set, falling back to the primary key value.
    pub fn id(&self) -> Option<&Bson> {
        match self.attributes.get("id") {
            Some(value) if !is_blank(value) => Some(value),
            _ => self.attributes.get(&self.schema.primary_key),
        }
    }

    /// Returns the stored form of `key`.
    pub fn get_raw(&self, key: &str) -> Option<&Bson> {
        self.attributes.get(key)
    }

    /// Returns the snapshot value of `key`.
    pub fn get_original(&self, key: &str) -> Option<&Bson> {
        self.original.get(key)
    }

    /// Returns the value of `key` as application code sees it.
    ///
    /// Attributes with a caster go through the caster's read side. Date attributes
    /// holding native timestamps surface as host time.
    pub fn get_display_value(&self, key: &str) -> Option<Value> {
        let stored = self.attributes.get(key)?;

        if let Some(caster) = self.schema.caster(key) {
            return Some(caster.read(stored));
        }

        if self.schema.is_date(key) {
            if let Bson::DateTime(_) = stored {
                return Some(crate::cast::DateTimeCaster::read(stored));
            }
        }

        Some(Value::Bson(stored.clone()))
    }

    /// Sets `key` to the stored form of `value`.
    ///
    /// # Errors
    ///
    /// Returns the caster's error, or [`ModelError::InvalidTimestamp`] for a date attribute
    /// given something that is not a point in time. The attribute store is left untouched
    /// on error.
    pub fn set_stored_value(&mut self, key: &str, value: impl Into<Value>) -> ModelResult<()> {
        let stored = self.to_stored(key, value.into())?;

        self.attributes.insert(key, stored);

        Ok(())
    }

    fn to_stored(&self, key: &str, value: Value) -> ModelResult<Bson> {
        if value.is_null() {
            return Ok(Bson::Null);
        }

        if let Some(caster) = self.schema.caster(key) {
            return caster.write(value);
        }

        if self.schema.is_date(key) {
            return match value {
                Value::Bson(Bson::DateTime(dt)) => Ok(Bson::DateTime(dt)),
                Value::Bson(other) => as_date_time(&other, &self.schema.date_format)
                    .map(|dt| Value::DateTime(dt).into_bson())
                    .ok_or_else(|| {
                        ModelError::InvalidTimestamp(format!("{key} cannot hold {other}"))
                    }),
                host => Ok(host.into_bson()),
            };
        }

        Ok(value.into_bson())
    }

    /// Removes `key` from the attribute store. The snapshot is left as is, so the attribute
    /// reads as changed until synchronized.
    pub fn unset(&mut self, key: &str) -> Option<Bson> {
        self.attributes.remove(key)
    }

    /// Whether `key` still matches its snapshot.
    pub fn is_attribute_unchanged(&self, key: &str) -> bool {
        equivalence::is_unchanged(&self.attributes, &self.original, &self.schema, key)
    }

    pub fn is_dirty(&self, key: &str) -> bool {
        self.attributes.contains_key(key) && !self.is_attribute_unchanged(key)
    }

    /// Returns every present attribute that no longer matches its snapshot.
    pub fn dirty(&self) -> Document {
        self.attributes
            .iter()
            .filter(|(key, _)| !self.is_attribute_unchanged(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Returns the snapshot attributes that are no longer in the attribute store.
    pub fn removed(&self) -> Vec<String> {
        self.original
            .keys()
            .filter(|key| !self.attributes.contains_key(key.as_str()))
            .cloned()
            .collect()
    }

    /// Makes the snapshot store equal to the attribute store.
    pub fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }

    /// Appends `values` to the array held by `key` and synchronizes its snapshot.
    pub fn append_values(&mut self, key: &str, values: Vec<Bson>, unique: bool) -> Vec<Bson> {
        mutation::push_attribute_values(self, key, values, unique)
    }

    /// Removes every occurrence of each of `values` from the array held by `key` and
    /// synchronizes its snapshot.
    pub fn remove_values(&mut self, key: &str, values: Vec<Bson>) -> Vec<Bson> {
        mutation::pull_attribute_values(self, key, values)
    }

    /// Returns a copy of the attribute store.
    pub fn to_document(&self) -> Document {
        self.attributes.clone()
    }
}

fn is_blank(value: &Bson) -> bool {
    match value {
        Bson::Null => true,
        Bson::String(s) => s.is_empty(),
        _ => false,
    }
}

impl HasAttributes for Model {
    fn attributes(&self) -> &Document {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Document {
        &mut self.attributes
    }

    fn original_attributes(&self) -> &Document {
        &self.original
    }

    fn sync_original_attribute(&mut self, key: &str) {
        match self.attributes.get(key) {
            Some(value) => {
                self.original.insert(key, value.clone());
            }
            None => {
                self.original.remove(key);
            }
        }
    }
}

impl Keyed for Model {
    fn key_name(&self) -> &str {
        &self.schema.primary_key
    }

    fn key(&self) -> Option<&Bson> {
        self.attributes.get(&self.schema.primary_key)
    }
}
