//! Block storage overlay.
//!
//! Turns one block into the records for its bucket group and writes them as a
//! single batch:
//!
//! | bucket            | key                 | value          |
//! |-------------------|---------------------|----------------|
//! | `buckets.block`   | primary index       | block body     |
//! | `buckets.number`  | height (u32 BE)     | primary index  |
//! | `buckets.key_mr`  | secondary index     | primary index  |
//! | `ChainHead`       | chain ID            | primary index  |
//!
//! Head updates for one chain must be serialized by the caller; the overlay
//! only guarantees that each batch is atomic.

use fedchain_types::Hash;
use tracing::debug;

use crate::{BlockBuckets, Bucket, DatabaseBatchable, KeyValueStore, Record, StoreError};

pub struct Overlay<S> {
    store: S,
}

impl<S: KeyValueStore> Overlay<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// Persist body, indexes and chain head in one batch.
    pub fn process_block_batch<B: DatabaseBatchable>(
        &self,
        buckets: BlockBuckets,
        block: &B,
    ) -> Result<(), StoreError> {
        let mut records = block_records(buckets, block)?;
        let primary = records[0].key.clone();
        records.push(Record::new(
            Bucket::ChainHead,
            block.chain_id().as_bytes().to_vec(),
            primary,
        ));
        self.store.put_batch(&records)?;
        debug!(
            bucket = %buckets.block,
            height = block.database_height(),
            chain_id = %block.chain_id(),
            "stored block and advanced chain head"
        );
        Ok(())
    }

    /// Persist body and indexes, leaving the chain head untouched.
    pub fn process_block_batch_without_head<B: DatabaseBatchable>(
        &self,
        buckets: BlockBuckets,
        block: &B,
    ) -> Result<(), StoreError> {
        let records = block_records(buckets, block)?;
        self.store.put_batch(&records)?;
        debug!(bucket = %buckets.block, height = block.database_height(), "stored block");
        Ok(())
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Look up a block body by primary index.
    pub fn fetch_block<B: DatabaseBatchable>(
        &self,
        bucket: Bucket,
        key: &Hash,
    ) -> Result<Option<B>, StoreError> {
        match self.store.get(bucket, key.as_bytes())? {
            Some(bytes) => decode_stored(bucket, key.as_bytes(), &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn fetch_block_by_height<B: DatabaseBatchable>(
        &self,
        buckets: BlockBuckets,
        height: u32,
    ) -> Result<Option<B>, StoreError> {
        self.fetch_via_index(buckets.number, &height.to_be_bytes(), buckets.block)
    }

    pub fn fetch_block_by_secondary_index<B: DatabaseBatchable>(
        &self,
        buckets: BlockBuckets,
        key: &Hash,
    ) -> Result<Option<B>, StoreError> {
        self.fetch_via_index(buckets.key_mr, key.as_bytes(), buckets.block)
    }

    /// Every block in `bucket`, in primary-index order.
    pub fn fetch_all_blocks_from_bucket<B: DatabaseBatchable>(
        &self,
        bucket: Bucket,
    ) -> Result<Vec<B>, StoreError> {
        self.store
            .list_bucket(bucket)?
            .iter()
            .map(|(key, value)| decode_stored(bucket, key, value))
            .collect()
    }

    /// Every key in `bucket`, in order.
    pub fn fetch_all_block_keys(&self, bucket: Bucket) -> Result<Vec<Hash>, StoreError> {
        self.store
            .list_bucket(bucket)?
            .into_iter()
            .map(|(key, _)| {
                Hash::from_slice(&key).ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "{bucket} key has {} bytes, expected {}",
                        key.len(),
                        Hash::LEN
                    ))
                })
            })
            .collect()
    }

    /// Resolve the head pointer for `chain_id` and load that block from
    /// `bucket`. `None` if no head was ever saved.
    pub fn fetch_chain_head_by_chain_id<B: DatabaseBatchable>(
        &self,
        bucket: Bucket,
        chain_id: &Hash,
    ) -> Result<Option<B>, StoreError> {
        let Some(primary) = self.store.get(Bucket::ChainHead, chain_id.as_bytes())? else {
            return Ok(None);
        };
        let primary = index_target(Bucket::ChainHead, &primary)?;
        match self.fetch_block(bucket, &primary)? {
            Some(block) => Ok(Some(block)),
            None => Err(StoreError::Corruption(format!(
                "chain head for {chain_id} points at missing {bucket} {primary}"
            ))),
        }
    }

    fn fetch_via_index<B: DatabaseBatchable>(
        &self,
        index: Bucket,
        key: &[u8],
        body: Bucket,
    ) -> Result<Option<B>, StoreError> {
        let Some(primary) = self.store.get(index, key)? else {
            return Ok(None);
        };
        let primary = index_target(index, &primary)?;
        match self.fetch_block(body, &primary)? {
            Some(block) => Ok(Some(block)),
            None => Err(StoreError::Corruption(format!(
                "{index} entry points at missing {body} {primary}"
            ))),
        }
    }
}

/// Body, height index and (optional) secondary index records. The body is
/// always first.
fn block_records<B: DatabaseBatchable>(
    buckets: BlockBuckets,
    block: &B,
) -> Result<Vec<Record>, StoreError> {
    let body = block
        .marshal_binary()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let primary = block
        .database_primary_index()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let secondary = block
        .database_secondary_index()
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let primary_bytes = primary.as_bytes().to_vec();
    let mut records = vec![
        Record::new(buckets.block, primary_bytes.clone(), body),
        Record::new(
            buckets.number,
            block.database_height().to_be_bytes().to_vec(),
            primary_bytes.clone(),
        ),
    ];
    if let Some(secondary) = secondary {
        records.push(Record::new(
            buckets.key_mr,
            secondary.as_bytes().to_vec(),
            primary_bytes,
        ));
    }
    Ok(records)
}

fn decode_stored<B: DatabaseBatchable>(
    bucket: Bucket,
    key: &[u8],
    bytes: &[u8],
) -> Result<B, StoreError> {
    B::unmarshal_binary(bytes).map_err(|e| {
        StoreError::Corruption(format!("{bucket} record {} failed to decode: {e}", hex_prefix(key)))
    })
}

fn index_target(bucket: Bucket, value: &[u8]) -> Result<Hash, StoreError> {
    Hash::from_slice(value).ok_or_else(|| {
        StoreError::Corruption(format!(
            "{bucket} value has {} bytes, expected {}",
            value.len(),
            Hash::LEN
        ))
    })
}

fn hex_prefix(key: &[u8]) -> String {
    hex::encode(&key[..key.len().min(4)])
}
