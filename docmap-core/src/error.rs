//! Error types and result types for attribute mapping and store operations.
//!
//! Coercion and hydration errors are raised synchronously by the write and hydrate paths
//! and always reach the caller. Use [`ModelResult<T>`] as the return type for fallible
//! operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised while mapping models onto a document store.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A value could not be coerced into an identifier handle.
    #[error("Invalid object ID passed: {0}")]
    InvalidIdentifier(String),
    /// A value could not be coerced into the store's native timestamp.
    #[error("Invalid DateTime or UTCDateTime passed: {0}")]
    InvalidTimestamp(String),
    /// A raw document could not be mapped onto a model's attribute shape.
    /// The whole record is rejected.
    #[error("Hydration failure: {0}")]
    HydrationFailure(String),
    /// A persisted operation was requested for a model without a primary key value.
    /// The argument is the primary key name.
    #[error("Model has no value for primary key {0}")]
    MissingKey(String),
    /// Serialization/deserialization error when converting between formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The addressed document was not found.
    /// The first argument is the document key, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

impl From<BsonError> for ModelError {
    fn from(err: BsonError) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for ModelError {
    fn from(err: SerdeJsonError) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
