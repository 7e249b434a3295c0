//! Write batching: groups record writes into a single LMDB write
//! transaction.
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! batch.put(Bucket::FactoidBlock, key, &body)?;
//! batch.put(Bucket::ChainHead, chain_id, key)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::RwTxn;

use fedchain_store::{Bucket, StoreError};

use crate::environment::{bucket_key, LmdbEnvironment};
use crate::LmdbError;

pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env().write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }

    // ── Bucket operations ───────────────────────────────────────────────

    pub fn put(&mut self, bucket: Bucket, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.env
            .buckets_db
            .put(&mut self.txn, &bucket_key(bucket, key), value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    pub fn delete(&mut self, bucket: Bucket, key: &[u8]) -> Result<(), StoreError> {
        self.env
            .buckets_db
            .delete(&mut self.txn, &bucket_key(bucket, key))
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Meta operations ─────────────────────────────────────────────────

    pub fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.env
            .meta_db
            .put(&mut self.txn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Commit / rollback ───────────────────────────────────────────────

    /// Commit all batched operations in a single write transaction.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
