//! Storage backend abstraction.
//!
//! The [`StoreBackend`] trait is the persistence collaborator the mapping layer talks to:
//! it runs raw expressions and applies field-level and array-level updates to a single
//! document addressed by its primary key. Implementations are async, thread-safe and
//! know nothing about models; they only see collections and BSON.
//!
//! # Examples
//!
//! ```ignore
//! use docmap::backend::{DocumentKey, RawExpression, StoreBackend};
//! use bson::{doc, oid::ObjectId};
//!
//! let backend = MyBackendImpl::new();
//! let id = ObjectId::new();
//!
//! backend.insert_document("users", doc! { "_id": id, "tags": ["a"] }).await?;
//! backend.push_values("users", &DocumentKey::new("_id", id), "tags", vec!["b".into()], true).await?;
//!
//! let result = backend.raw("users", RawExpression::Count(doc! {})).await?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use std::fmt::{self, Debug, Display};

use crate::{error::ModelResult, result::QueryResult};

/// Addresses one document by its primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentKey {
    /// Name of the primary key field.
    pub name: String,
    /// Primary key value.
    pub value: Bson,
}

impl DocumentKey {
    pub fn new(name: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Filter document matching exactly this key.
    pub fn filter(&self) -> Document {
        doc! { self.name.clone(): self.value.clone() }
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Bson::ObjectId(oid) => write!(f, "{}={}", self.name, oid.to_hex()),
            other => write!(f, "{}={}", self.name, other),
        }
    }
}

/// A raw expression executed directly against a collection.
///
/// Filters use the store's native filter document syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum RawExpression {
    /// Every matching document, as a cursor.
    Find(Document),
    /// The first matching document, or null.
    FindOne(Document),
    /// The number of matching documents.
    Count(Document),
}

/// Abstract interface for document storage backends.
///
/// # Error Handling
///
/// Operations return [`ModelResult<T>`](crate::error::ModelResult). Store failures are
/// reported as [`ModelError::Backend`](crate::error::ModelError::Backend); operations on
/// a key with no matching document are not errors and report zero affected documents.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a new document.
    async fn insert_document(&self, collection: &str, document: Document) -> ModelResult<()>;

    /// Sets the given fields on the document addressed by `key`, leaving other fields alone.
    ///
    /// Returns the number of documents matched.
    async fn update_fields(
        &self,
        collection: &str,
        key: &DocumentKey,
        fields: Document,
    ) -> ModelResult<u64>;

    /// Removes the given fields from the document addressed by `key`.
    ///
    /// Returns the number of documents matched.
    async fn unset_fields(
        &self,
        collection: &str,
        key: &DocumentKey,
        fields: Vec<String>,
    ) -> ModelResult<u64>;

    /// Appends `values` to the array `field` of the document addressed by `key`.
    ///
    /// With `unique`, values already present in the array are skipped.
    /// Returns the number of documents matched.
    async fn push_values(
        &self,
        collection: &str,
        key: &DocumentKey,
        field: &str,
        values: Vec<Bson>,
        unique: bool,
    ) -> ModelResult<u64>;

    /// Removes every occurrence of each of `values` from the array `field` of the
    /// document addressed by `key`.
    ///
    /// Returns the number of documents matched.
    async fn pull_values(
        &self,
        collection: &str,
        key: &DocumentKey,
        field: &str,
        values: Vec<Bson>,
    ) -> ModelResult<u64>;

    /// Runs a raw expression and returns whatever shape it produces.
    async fn raw(&self, collection: &str, expression: RawExpression) -> ModelResult<QueryResult>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> ModelResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_document(&self, collection: &str, document: Document) -> ModelResult<()> {
        (*self).insert_document(collection, document).await
    }

    async fn update_fields(
        &self,
        collection: &str,
        key: &DocumentKey,
        fields: Document,
    ) -> ModelResult<u64> {
        (*self).update_fields(collection, key, fields).await
    }

    async fn unset_fields(
        &self,
        collection: &str,
        key: &DocumentKey,
        fields: Vec<String>,
    ) -> ModelResult<u64> {
        (*self).unset_fields(collection, key, fields).await
    }

    async fn push_values(
        &self,
        collection: &str,
        key: &DocumentKey,
        field: &str,
        values: Vec<Bson>,
        unique: bool,
    ) -> ModelResult<u64> {
        (*self)
            .push_values(collection, key, field, values, unique)
            .await
    }

    async fn pull_values(
        &self,
        collection: &str,
        key: &DocumentKey,
        field: &str,
        values: Vec<Bson>,
    ) -> ModelResult<u64> {
        (*self).pull_values(collection, key, field, values).await
    }

    async fn raw(&self, collection: &str, expression: RawExpression) -> ModelResult<QueryResult> {
        (*self).raw(collection, expression).await
    }
}

/// Factory trait for creating backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> ModelResult<Self::Backend>;
}
