//! Main docmap crate: typed attribute mapping over BSON document stores.
//!
//! This crate is the entry point for users of docmap. It re-exports the core types from
//! the sub-crates and gives access to the storage backends.
//!
//! # Features
//!
//! - **Explicit schemas** - Declare keys, casters and date attributes per model, in code,
//!   with `#[derive(Model)]`, or from JSON
//! - **Casting** - Identifier handles and timestamps convert between host and stored form
//! - **Dirty checking** - Type-aware comparison of attributes against their snapshot
//! - **Array mutation** - Push/pull on array attributes kept in step with the store
//! - **Result normalization** - Cursors, single documents and scalars come back uniformly
//! - **Multiple backends** - In-memory and MongoDB storage
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[derive(Model)]
//! #[model(collection = "users", dates(deleted_at))]
//! pub struct User;
//!
//! #[tokio::main]
//! async fn main() -> ModelResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let users = store.model::<User>();
//!
//!     let mut user = users.new_model();
//!     user.set_stored_value("name", "Ada")?;
//!     users.save(&mut user).await?;
//!
//!     users.push(&mut user, "roles", vec!["admin".into()], true).await?;
//!     assert!(user.is_attribute_unchanged("roles"));
//!
//!     let found = users.find(doc! { "roles": "admin" }).await?;
//!     println!("Found users: {:?}", found);
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `mongodb` - Persistent MongoDB backend (requires the `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as docmap;

pub mod logging;
pub mod prelude;

pub use docmap_core::{
    backend, builder, cast, date, equivalence, error, model, mutation, result, schema, store, value,
};
pub use docmap_macros::Model;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docmap_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmap_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
