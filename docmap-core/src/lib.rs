//! Typed attribute mapping and mutation tracking over BSON document stores.
//!
//! This crate is the core of the docmap project and provides:
//!
//! - **Values** ([`value`]) - Host-side values and comparison helpers
//! - **Casters** ([`cast`]) - Identifier and timestamp conversions between host and stored form
//! - **Schemas** ([`schema`]) - Explicit per-model configuration of keys, casts and dates
//! - **Models** ([`model`]) - Attribute and snapshot stores with accessors and mutators
//! - **Dirty checking** ([`equivalence`]) - Type-aware comparison against the snapshot
//! - **Array mutation** ([`mutation`]) - Append/remove on array attributes with snapshot sync
//! - **Result normalization** ([`result`]) - Hydration of raw query results
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Model queries** ([`builder`]) - Reads and persisted mutations for one model schema
//! - **Document store** ([`store`]) - Main entry point tying a backend to schemas
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use docmap::prelude::*;
//! use bson::doc;
//!
//! let schema = Arc::new(ModelSchema::new("users").date("deleted_at"));
//! let normalizer = ResultNormalizer::new(schema);
//!
//! let mut user = normalizer.hydrate_one(doc! { "_id": "5f1d7a3c9b1e8a0012345678", "tags": ["a"] }.into())?;
//! user.append_values("tags", vec!["a".into(), "b".into()], true);
//! assert!(user.is_attribute_unchanged("tags"));
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_core;

pub mod backend;
pub mod builder;
pub mod cast;
pub mod date;
pub mod equivalence;
pub mod error;
pub mod model;
pub mod mutation;
pub mod result;
pub mod schema;
pub mod store;
pub mod value;
