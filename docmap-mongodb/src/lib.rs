//! MongoDB backend implementation for docmap.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! Array mutations map onto `$push`/`$addToSet` with `$each` and `$pullAll`, dropped
//! fields onto `$unset`, and field updates onto `$set`, all addressed by primary key.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docmap = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docmap::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! let store = MongoDbStore::builder("mongodb://localhost:27017", "my_database")
//!     .build()
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_mongodb;

pub mod store;
pub(crate) mod update;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
