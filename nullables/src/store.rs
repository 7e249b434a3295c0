//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use fedchain_store::{Bucket, KeyValueStore, MetaStore, Record, StoreError};

const SCHEMA_VERSION_KEY: &str = "schema_version";

/// An in-memory bucket + meta store.
///
/// Batches are applied under one lock, so they are atomic with respect to
/// readers, matching the LMDB backend.
pub struct NullStore {
    records: Mutex<BTreeMap<(u8, Vec<u8>), Vec<u8>>>,
    meta: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
    batches: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            meta: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
            batches: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent write fail with a backend error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of batches successfully applied.
    pub fn batches_written(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Overwrite a single record, bypassing failure injection. Useful for
    /// planting corrupt data.
    pub fn insert_raw(&self, bucket: Bucket, key: &[u8], value: &[u8]) {
        self.records
            .lock()
            .unwrap()
            .insert((bucket.as_u8(), key.to_vec()), value.to_vec());
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for NullStore {
    fn put_batch(&self, records: &[Record]) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut map = self.records.lock().unwrap();
        for r in records {
            map.insert((r.bucket.as_u8(), r.key.clone()), r.value.clone());
        }
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(bucket.as_u8(), key.to_vec()))
            .cloned())
    }

    fn list_bucket(&self, bucket: Bucket) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let tag = bucket.as_u8();
        Ok(self
            .records
            .lock()
            .unwrap()
            .range((tag, Vec::new())..)
            .take_while(|((t, _), _)| *t == tag)
            .map(|((_, k), v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.meta
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.meta.lock().unwrap().get(key).cloned())
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.meta.lock().unwrap().remove(key);
        Ok(())
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        match self.get_meta(SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption("schema_version has unexpected length".to_string())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta(SCHEMA_VERSION_KEY, &version.to_le_bytes())
    }
}
