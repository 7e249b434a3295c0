//! Abstract storage for fedchain.
//!
//! Backends implement [`KeyValueStore`] (bucketed key/value records written
//! in atomic batches) and [`MetaStore`] (internal bookkeeping). Everything
//! block-shaped goes through [`Overlay`], which turns a [`DatabaseBatchable`]
//! block into the body, index and chain-head records for its bucket group.

pub mod batchable;
pub mod bucket;
pub mod error;
pub mod kv;
pub mod meta;
pub mod overlay;

pub use batchable::DatabaseBatchable;
pub use bucket::{BlockBuckets, Bucket};
pub use error::StoreError;
pub use kv::{KeyValueStore, Record};
pub use meta::MetaStore;
pub use overlay::Overlay;
