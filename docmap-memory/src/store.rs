//! In-memory storage implementation.
//!
//! Documents live in insertion order per collection behind an async-aware read-write
//! lock, so cursor results come back in a stable order.

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, trace};

use docmap_core::{
    backend::{DocumentKey, RawExpression, StoreBackend, StoreBackendBuilder},
    error::{ModelError, ModelResult},
    mutation::{appended, pulled},
    result::QueryResult,
    value::same_value,
};

use crate::evaluator::matches;

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable; clones share the same underlying data.
/// Queries scan every document in a collection.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::InMemoryStore;
/// use docmap::backend::{RawExpression, StoreBackend};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// store.insert_document("users", doc! { "name": "Ada" }).await?;
///
/// let count = store.raw("users", RawExpression::Count(doc! {})).await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }

    /// Applies `update` to the document addressed by `key`.
    ///
    /// Returns the number of matched documents (zero or one).
    async fn modify<F>(&self, collection: &str, key: &DocumentKey, update: F) -> ModelResult<u64>
    where
        F: FnOnce(&mut Document) -> ModelResult<()> + Send,
    {
        let mut store = self.store.write().await;

        let Some(document) = store
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|doc| has_key(doc, key)))
        else {
            trace!(collection, %key, "no document matched");
            return Ok(0);
        };

        update(document)?;

        Ok(1)
    }
}

fn has_key(document: &Document, key: &DocumentKey) -> bool {
    document
        .get(&key.name)
        .is_some_and(|value| same_value(value, &key.value))
}

/// Reads `field` as an array operand. Missing fields count as empty arrays.
fn array_field<'a>(document: &'a Document, field: &str) -> ModelResult<Option<&'a Bson>> {
    match document.get(field) {
        None | Some(Bson::Array(_)) => Ok(document.get(field)),
        Some(_) => Err(ModelError::Backend(format!(
            "field {field} must be an array"
        ))),
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_document(&self, collection: &str, mut document: Document) -> ModelResult<()> {
        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();

        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };

        if documents
            .iter()
            .any(|doc| doc.get("_id").is_some_and(|existing| same_value(existing, &id)))
        {
            return Err(ModelError::Backend(format!(
                "duplicate key {id} in collection {collection}"
            )));
        }

        debug!(collection, "inserting document");
        documents.push(document);

        Ok(())
    }

    async fn update_fields(&self, collection: &str, key: &DocumentKey, fields: Document) -> ModelResult<u64> {
        self.modify(collection, key, |document| {
            for (field, value) in fields {
                document.insert(field, value);
            }
            Ok(())
        })
        .await
    }

    async fn unset_fields(&self, collection: &str, key: &DocumentKey, fields: Vec<String>) -> ModelResult<u64> {
        self.modify(collection, key, |document| {
            for field in &fields {
                document.remove(field);
            }
            Ok(())
        })
        .await
    }

    async fn push_values(
        &self,
        collection: &str,
        key: &DocumentKey,
        field: &str,
        values: Vec<Bson>,
        unique: bool,
    ) -> ModelResult<u64> {
        self.modify(collection, key, |document| {
            let updated = appended(array_field(document, field)?, values, unique);
            document.insert(field, Bson::Array(updated));
            Ok(())
        })
        .await
    }

    async fn pull_values(
        &self,
        collection: &str,
        key: &DocumentKey,
        field: &str,
        values: Vec<Bson>,
    ) -> ModelResult<u64> {
        self.modify(collection, key, |document| {
            if let Some(current) = array_field(document, field)? {
                let updated = pulled(Some(current), &values);
                document.insert(field, Bson::Array(updated));
            }
            Ok(())
        })
        .await
    }

    async fn raw(&self, collection: &str, expression: RawExpression) -> ModelResult<QueryResult> {
        let store = self.store.read().await;
        let documents = store.get(collection).map(Vec::as_slice).unwrap_or_default();

        let filter = match &expression {
            RawExpression::Find(filter) | RawExpression::FindOne(filter) | RawExpression::Count(filter) => filter,
        };

        let mut matched = Vec::new();
        for document in documents {
            if matches(document, filter)? {
                matched.push(document);
            }
        }

        Ok(match expression {
            RawExpression::Find(_) => {
                QueryResult::cursor(matched.into_iter().cloned().map(Bson::Document))
            }
            RawExpression::FindOne(_) => match matched.first() {
                Some(document) => QueryResult::Document((*document).clone()),
                None => QueryResult::Value(Bson::Null),
            },
            RawExpression::Count(_) => QueryResult::Value(Bson::Int64(matched.len() as i64)),
        })
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> ModelResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
