//! Model-level queries and persisted mutations.
//!
//! [`ModelQuery`] binds a backend to a schema. Reads go through [`ResultNormalizer`] so
//! callers always get models (or an untouched scalar). Writes issued on behalf of a model
//! are keyed by its primary key.
//!
//! Persisted mutations wait for the store to acknowledge the operation before touching
//! the model. A failed store call leaves both the attribute store and the snapshot store
//! as they were, so the caller can retry without re-verifying.

use bson::{Bson, Document, oid::ObjectId};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::{
    backend::{DocumentKey, RawExpression, StoreBackend},
    error::{ModelError, ModelResult},
    model::{HasAttributes, Keyed, Model},
    mutation,
    result::{Normalized, ResultNormalizer},
    schema::ModelSchema,
};

/// Queries and mutations for one model schema against one backend.
#[derive(Debug)]
pub struct ModelQuery<'a, B: StoreBackend> {
    backend: &'a B,
    schema: Arc<ModelSchema>,
    normalizer: ResultNormalizer,
}

impl<'a, B: StoreBackend> ModelQuery<'a, B> {
    pub fn new(backend: &'a B, schema: Arc<ModelSchema>) -> Self {
        Self {
            backend,
            normalizer: ResultNormalizer::new(schema.clone()),
            schema,
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Creates an empty model of this query's schema.
    pub fn new_model(&self) -> Model {
        Model::new(self.schema.clone())
    }

    /// Runs a raw expression and normalizes whatever it returns.
    ///
    /// # Errors
    ///
    /// Returns backend errors, or a hydration failure for a single-document result.
    pub async fn raw(&self, expression: RawExpression) -> ModelResult<Normalized> {
        trace!(collection = %self.schema.collection, ?expression, "running raw expression");

        let result = self
            .backend
            .raw(&self.schema.collection, expression)
            .await?;

        self.normalizer.normalize(result)
    }

    /// Returns every model matching `filter`, failing if any record cannot be hydrated.
    pub async fn find(&self, filter: Document) -> ModelResult<Vec<Model>> {
        self.raw(RawExpression::Find(filter))
            .await?
            .into_models()
    }

    /// Returns the first model matching `filter`.
    pub async fn first(&self, filter: Document) -> ModelResult<Option<Model>> {
        Ok(self
            .raw(RawExpression::FindOne(filter))
            .await?
            .into_models()?
            .into_iter()
            .next())
    }

    pub async fn count(&self, filter: Document) -> ModelResult<u64> {
        Ok(
            match self.raw(RawExpression::Count(filter)).await?.into_value() {
                Some(Bson::Int64(n)) => n.max(0) as u64,
                Some(Bson::Int32(n)) => n.max(0) as u64,
                _ => 0,
            }
        )
    }

    /// Persists `model`.
    ///
    /// New models are inserted, receiving a fresh object id when they have no key yet.
    /// Existing models send their dirty attributes and unset the attributes removed since
    /// the last sync. The model is only touched once the store confirms.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DocumentNotFound`] when an existing model's document is no
    /// longer in the store, besides backend and coercion errors.
    pub async fn save(&self, model: &mut Model) -> ModelResult<()> {
        if model.exists() {
            return self.update(model).await;
        }

        let mut staged = model.clone();

        if matches!(staged.key(), None | Some(Bson::Null)) {
            let key_name = self.schema.primary_key.clone();
            staged.set_stored_value(&key_name, ObjectId::new())?;
        }

        let key = staged.document_key()?;
        debug!(collection = %self.schema.collection, %key, "inserting model");

        self.backend
            .insert_document(&self.schema.collection, staged.to_document())
            .await?;

        staged.mark_exists();
        staged.sync_original();
        *model = staged;

        Ok(())
    }

    async fn update(&self, model: &mut Model) -> ModelResult<()> {
        let dirty = model.dirty();
        let removed = model.removed();

        if dirty.is_empty() && removed.is_empty() {
            return Ok(());
        }

        let key = model.document_key()?;
        debug!(
            collection = %self.schema.collection,
            %key,
            fields = dirty.len(),
            removed = removed.len(),
            "updating model"
        );

        if !dirty.is_empty() {
            let matched = self
                .backend
                .update_fields(&self.schema.collection, &key, dirty)
                .await?;
            self.confirm(&key, matched)?;
        }

        if !removed.is_empty() {
            let matched = self
                .backend
                .unset_fields(&self.schema.collection, &key, removed)
                .await?;
            self.confirm(&key, matched)?;
        }

        model.sync_original();

        Ok(())
    }

    /// Turns a zero match count into [`ModelError::DocumentNotFound`].
    fn confirm(&self, key: &DocumentKey, matched: u64) -> ModelResult<u64> {
        if matched == 0 {
            return Err(ModelError::DocumentNotFound(
                key.to_string(),
                self.schema.collection.clone(),
            ));
        }

        Ok(matched)
    }

    /// Appends `values` to the array attribute `key` in the store, then in memory.
    ///
    /// Returns the updated in-memory sequence.
    pub async fn push(
        &self,
        model: &mut Model,
        key: &str,
        values: Vec<Bson>,
        unique: bool,
    ) -> ModelResult<Vec<Bson>> {
        let document_key = model.document_key()?;
        debug!(
            collection = %self.schema.collection,
            key = %document_key,
            field = key,
            values = values.len(),
            unique,
            "pushing values"
        );

        let matched = self
            .backend
            .push_values(&self.schema.collection, &document_key, key, values.clone(), unique)
            .await?;
        self.confirm(&document_key, matched)?;

        Ok(mutation::push_attribute_values(model, key, values, unique))
    }

    /// Removes `values` from the array attribute `key` in the store, then in memory.
    ///
    /// Returns the updated in-memory sequence.
    pub async fn pull(&self, model: &mut Model, key: &str, values: Vec<Bson>) -> ModelResult<Vec<Bson>> {
        let document_key = model.document_key()?;
        debug!(
            collection = %self.schema.collection,
            key = %document_key,
            field = key,
            values = values.len(),
            "pulling values"
        );

        let matched = self
            .backend
            .pull_values(&self.schema.collection, &document_key, key, values.clone())
            .await?;
        self.confirm(&document_key, matched)?;

        Ok(mutation::pull_attribute_values(model, key, values))
    }

    /// Removes `fields` from the stored document, then from the model.
    ///
    /// Returns the number of documents the store matched.
    pub async fn drop_fields(&self, model: &mut Model, fields: Vec<String>) -> ModelResult<u64> {
        let document_key = model.document_key()?;
        debug!(collection = %self.schema.collection, key = %document_key, ?fields, "dropping fields");

        let matched = self
            .backend
            .unset_fields(&self.schema.collection, &document_key, fields.clone())
            .await?;
        let matched = self.confirm(&document_key, matched)?;

        for field in &fields {
            model.unset(field);
            model.sync_original_attribute(field);
        }

        Ok(matched)
    }
}
