//! LMDB storage backend for fedchain.
//!
//! Implements [`KeyValueStore`](fedchain_store::KeyValueStore) and
//! [`MetaStore`](fedchain_store::MetaStore) on top of the `heed` bindings.
//! All buckets share one LMDB database; a record's key is its bucket tag
//! followed by the caller's key, so a bucket scan is a prefix scan.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod meta;
pub mod migration;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use meta::LmdbMetaStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use write_batch::WriteBatch;
