//! Serialized block acceptance per chain.
//!
//! Blocks on different chains may be written concurrently; blocks on the same
//! chain take that chain's lock, so head updates never interleave. A backend
//! or corruption failure halts the chain: later blocks for it are refused
//! until an operator calls [`BlockAcceptor::resume`]. A block that fails to
//! serialize is refused on its own and does not halt anything.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use fedchain_ledger::{FBlock, FBlockStore};
use fedchain_store::{BlockBuckets, DatabaseBatchable, KeyValueStore, Overlay, StoreError};
use fedchain_types::Hash;
use tracing::{debug, error, info, warn};

use crate::{lock_unpoisoned, NodeError, NodeMetrics};

pub struct BlockAcceptor<S> {
    overlay: Arc<Overlay<S>>,
    chain_locks: Mutex<HashMap<Hash, Arc<Mutex<()>>>>,
    halted: Mutex<HashSet<Hash>>,
    metrics: Arc<NodeMetrics>,
}

impl<S: KeyValueStore> BlockAcceptor<S> {
    pub fn new(overlay: Arc<Overlay<S>>, metrics: Arc<NodeMetrics>) -> Self {
        Self {
            overlay,
            chain_locks: Mutex::new(HashMap::new()),
            halted: Mutex::new(HashSet::new()),
            metrics,
        }
    }

    pub fn overlay(&self) -> &Overlay<S> {
        &self.overlay
    }

    /// Persist a block and advance its chain head.
    pub fn accept_block<B: DatabaseBatchable>(
        &self,
        buckets: BlockBuckets,
        block: &B,
    ) -> Result<(), NodeError> {
        self.persist(block.chain_id(), block.database_height(), |overlay| {
            overlay.process_block_batch(buckets, block)
        })
    }

    pub fn accept_fblock(&self, block: &FBlock) -> Result<(), NodeError> {
        self.persist(block.chain_id(), block.db_height(), |overlay| {
            overlay.process_fblock_batch(block)
        })
    }

    pub fn factoid_head(&self) -> Result<Option<FBlock>, NodeError> {
        Ok(self.overlay.fetch_factoid_block_head()?)
    }

    // ── Halted chains ───────────────────────────────────────────────────

    pub fn is_halted(&self, chain_id: &Hash) -> bool {
        lock_unpoisoned(&self.halted).contains(chain_id)
    }

    pub fn halted_chains(&self) -> Vec<Hash> {
        let mut chains: Vec<Hash> = lock_unpoisoned(&self.halted).iter().copied().collect();
        chains.sort();
        chains
    }

    /// Allow a halted chain to accept blocks again. Returns whether it was
    /// halted.
    pub fn resume(&self, chain_id: &Hash) -> bool {
        let mut halted = lock_unpoisoned(&self.halted);
        let was_halted = halted.remove(chain_id);
        self.metrics.halted_chains.set(halted.len() as i64);
        if was_halted {
            info!(chain_id = %chain_id, "chain resumed");
        }
        was_halted
    }

    // ── Chain locks ─────────────────────────────────────────────────────

    fn chain_lock(&self, chain_id: &Hash) -> Arc<Mutex<()>> {
        lock_unpoisoned(&self.chain_locks)
            .entry(*chain_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of chains with a lock entry.
    pub fn active_chains(&self) -> usize {
        lock_unpoisoned(&self.chain_locks).len()
    }

    /// Drop lock entries no writer currently holds.
    pub fn cleanup(&self) {
        lock_unpoisoned(&self.chain_locks).retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    fn persist<F>(&self, chain_id: Hash, height: u32, write: F) -> Result<(), NodeError>
    where
        F: FnOnce(&Overlay<S>) -> Result<(), StoreError>,
    {
        let lock = self.chain_lock(&chain_id);
        let _guard = lock_unpoisoned(&lock);

        if self.is_halted(&chain_id) {
            return Err(NodeError::ChainHalted(chain_id));
        }

        match write(&self.overlay) {
            Ok(()) => {
                self.metrics.blocks_persisted.inc();
                debug!(chain_id = %chain_id, height, "block accepted");
                Ok(())
            }
            Err(e @ StoreError::Serialization(_)) => {
                // Nothing reached storage; the chain can take the next block.
                warn!(chain_id = %chain_id, height, error = %e, "block failed to serialize");
                Err(e.into())
            }
            Err(e) => {
                let mut halted = lock_unpoisoned(&self.halted);
                halted.insert(chain_id);
                self.metrics.halted_chains.set(halted.len() as i64);
                self.metrics.storage_failures.inc();
                error!(chain_id = %chain_id, height, error = %e, "block write failed, halting chain");
                Err(e.into())
            }
        }
    }
}
