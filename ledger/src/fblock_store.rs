//! Typed Factoid-block entry points on the storage overlay.

use fedchain_store::{BlockBuckets, KeyValueStore, Overlay, StoreError};
use fedchain_types::Hash;

use crate::{FBlock, FACTOID_CHAIN_ID};

const BUCKETS: BlockBuckets = BlockBuckets::FACTOID_BLOCK;

pub trait FBlockStore {
    /// Store the block with its indexes and make it the Factoid chain head.
    fn process_fblock_batch(&self, block: &FBlock) -> Result<(), StoreError>;

    /// Store the block with its indexes without moving the chain head.
    fn process_fblock_batch_without_head(&self, block: &FBlock) -> Result<(), StoreError>;

    /// Look up by key MR (the primary index).
    fn fetch_fblock_by_hash(&self, hash: &Hash) -> Result<Option<FBlock>, StoreError>;

    fn fetch_fblock_by_height(&self, db_height: u32) -> Result<Option<FBlock>, StoreError>;

    fn fetch_fblock_by_ledger_key_mr(&self, hash: &Hash) -> Result<Option<FBlock>, StoreError>;

    /// Every stored Factoid block, in key-MR order.
    fn fetch_all_fblocks(&self) -> Result<Vec<FBlock>, StoreError>;

    fn fetch_all_fblock_keys(&self) -> Result<Vec<Hash>, StoreError>;

    /// Same write as [`process_fblock_batch`](Self::process_fblock_batch).
    fn save_factoid_block_head(&self, block: &FBlock) -> Result<(), StoreError>;

    fn fetch_factoid_block_head(&self) -> Result<Option<FBlock>, StoreError>;
}

impl<S: KeyValueStore> FBlockStore for Overlay<S> {
    fn process_fblock_batch(&self, block: &FBlock) -> Result<(), StoreError> {
        self.process_block_batch(BUCKETS, block)
    }

    fn process_fblock_batch_without_head(&self, block: &FBlock) -> Result<(), StoreError> {
        self.process_block_batch_without_head(BUCKETS, block)
    }

    fn fetch_fblock_by_hash(&self, hash: &Hash) -> Result<Option<FBlock>, StoreError> {
        self.fetch_block(BUCKETS.block, hash)
    }

    fn fetch_fblock_by_height(&self, db_height: u32) -> Result<Option<FBlock>, StoreError> {
        self.fetch_block_by_height(BUCKETS, db_height)
    }

    fn fetch_fblock_by_ledger_key_mr(&self, hash: &Hash) -> Result<Option<FBlock>, StoreError> {
        self.fetch_block_by_secondary_index(BUCKETS, hash)
    }

    fn fetch_all_fblocks(&self) -> Result<Vec<FBlock>, StoreError> {
        self.fetch_all_blocks_from_bucket(BUCKETS.block)
    }

    fn fetch_all_fblock_keys(&self) -> Result<Vec<Hash>, StoreError> {
        self.fetch_all_block_keys(BUCKETS.block)
    }

    fn save_factoid_block_head(&self, block: &FBlock) -> Result<(), StoreError> {
        self.process_fblock_batch(block)
    }

    fn fetch_factoid_block_head(&self) -> Result<Option<FBlock>, StoreError> {
        self.fetch_chain_head_by_chain_id(BUCKETS.block, &FACTOID_CHAIN_ID)
    }
}
