//! In-memory document storage backend for docmap.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for development
//! and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Stable ordering** - Documents are returned in insertion order
//! - **Native filter subset** - Equality, `$and`/`$or` and common comparison operators
//! - **Array updates** - Push (optionally unique) and pull-all with store semantics
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//! let users = store.query(Arc::new(ModelSchema::new("users")));
//!
//! let mut user = users.new_model();
//! user.set_stored_value("name", "Ada")?;
//! users.save(&mut user).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
