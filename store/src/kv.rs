//! Bucketed key/value storage.

use std::sync::Arc;

use crate::{Bucket, StoreError};

/// One write within a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub bucket: Bucket,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Record {
    pub fn new(bucket: Bucket, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            bucket,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A backend that stores records under `(bucket, key)`.
///
/// Implementations must apply `put_batch` atomically: readers observe either
/// every record of a batch or none of them.
pub trait KeyValueStore: Send + Sync {
    fn put_batch(&self, records: &[Record]) -> Result<(), StoreError>;

    fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Every `(key, value)` pair in `bucket`, in ascending key order.
    fn list_bucket(&self, bucket: Bucket) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn put_batch(&self, records: &[Record]) -> Result<(), StoreError> {
        (**self).put_batch(records)
    }

    fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(bucket, key)
    }

    fn list_bucket(&self, bucket: Bucket) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        (**self).list_bucket(bucket)
    }
}
