//! Convenient re-exports of commonly used types from docmap.
//!
//! ```ignore
//! use docmap::prelude::*;
//! ```

pub use std::sync::Arc;

pub use docmap_core::{
    backend::{DocumentKey, RawExpression, StoreBackend, StoreBackendBuilder},
    builder::ModelQuery,
    cast::{CasterKind, DateTimeCaster, ObjectIdCaster},
    error::{ModelError, ModelResult},
    model::{HasAttributes, Keyed, Model},
    result::{Normalized, QueryResult, ResultNormalizer},
    schema::{ModelDefinition, ModelSchema},
    store::DocumentStore,
    value::Value,
};
pub use docmap_macros::Model;
