//! Document store facade.
//!
//! [`DocumentStore`] owns a backend and hands out [`ModelQuery`] values bound to a schema.

use std::sync::Arc;

use crate::{
    backend::StoreBackend,
    builder::ModelQuery,
    error::ModelResult,
    schema::{ModelDefinition, ModelSchema},
};

/// Entry point tying a storage backend to model schemas.
///
/// # Example
///
/// ```ignore
/// let store = DocumentStore::new(InMemoryStore::new());
/// let users = store.model::<User>();
///
/// let mut user = users.new_model();
/// user.set_stored_value("name", "Ada")?;
/// users.save(&mut user).await?;
/// ```
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns a query bound to a declared model type.
    pub fn model<D: ModelDefinition>(&self) -> ModelQuery<'_, B> {
        self.query(Arc::new(D::schema()))
    }

    /// Returns a query bound to an explicit schema.
    pub fn query(&self, schema: Arc<ModelSchema>) -> ModelQuery<'_, B> {
        ModelQuery::new(&self.backend, schema)
    }

    /// Shuts down the underlying backend.
    pub async fn shutdown(self) -> ModelResult<()> {
        self.backend.shutdown().await
    }
}
