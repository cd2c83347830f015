//! MongoDB storage implementation.

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::TryStreamExt;
use mongodb::{Client, Collection as MongoCollection, options::ClientOptions};
use tracing::debug;

use docmap_core::{
    backend::{DocumentKey, RawExpression, StoreBackend, StoreBackendBuilder},
    error::{ModelError, ModelResult},
    result::QueryResult,
};

use crate::update::UpdateTranslator;

/// MongoDB-backed [`StoreBackend`].
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    async fn update_one(&self, collection: &str, key: &DocumentKey, update: Document) -> ModelResult<u64> {
        debug!(collection, %key, ?update, "updating document");

        Ok(
            self.get_collection(collection)
                .update_one(key.filter(), update)
                .await
                .map_err(|e| ModelError::Backend(e.to_string()))?
                .matched_count
        )
    }

    async fn shutdown(self) -> ModelResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_document(&self, collection: &str, document: Document) -> ModelResult<()> {
        self.get_collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| ModelError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn update_fields(&self, collection: &str, key: &DocumentKey, fields: Document) -> ModelResult<u64> {
        self.update_one(collection, key, UpdateTranslator::set(fields)).await
    }

    async fn unset_fields(&self, collection: &str, key: &DocumentKey, fields: Vec<String>) -> ModelResult<u64> {
        self.update_one(collection, key, UpdateTranslator::unset(&fields)).await
    }

    async fn push_values(
        &self,
        collection: &str,
        key: &DocumentKey,
        field: &str,
        values: Vec<Bson>,
        unique: bool,
    ) -> ModelResult<u64> {
        self.update_one(collection, key, UpdateTranslator::push(field, values, unique)).await
    }

    async fn pull_values(
        &self,
        collection: &str,
        key: &DocumentKey,
        field: &str,
        values: Vec<Bson>,
    ) -> ModelResult<u64> {
        self.update_one(collection, key, UpdateTranslator::pull(field, values)).await
    }

    async fn raw(&self, collection: &str, expression: RawExpression) -> ModelResult<QueryResult> {
        let collection = self.get_collection(collection);

        Ok(match expression {
            RawExpression::Find(filter) => QueryResult::cursor(
                collection
                    .find(filter)
                    .await
                    .map_err(|e| ModelError::Backend(e.to_string()))?
                    .try_collect::<Vec<Document>>()
                    .await
                    .map_err(|e| ModelError::Backend(e.to_string()))?
                    .into_iter()
                    .map(Bson::Document),
            ),
            RawExpression::FindOne(filter) => match collection
                .find_one(filter)
                .await
                .map_err(|e| ModelError::Backend(e.to_string()))?
            {
                Some(document) => QueryResult::Document(document),
                None => QueryResult::Value(Bson::Null),
            },
            RawExpression::Count(filter) => QueryResult::Value(Bson::Int64(
                collection
                    .count_documents(filter)
                    .await
                    .map_err(|e| ModelError::Backend(e.to_string()))? as i64,
            )),
        })
    }

    async fn shutdown(self) -> ModelResult<()> {
        self.shutdown().await
    }
}

/// Builder connecting a [`MongoDbStore`] from a connection string.
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> ModelResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| ModelError::Initialization(e.to_string()))?,
            )
            .map_err(|e| ModelError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
