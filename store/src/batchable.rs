//! The contract a block type meets to be persisted through the overlay.

use fedchain_types::Hash;
use std::fmt::Display;

pub trait DatabaseBatchable: Sized {
    type Error: Display;

    /// The chain this block belongs to; keys the chain-head bucket.
    fn chain_id(&self) -> Hash;

    /// Height of the block within its chain.
    fn database_height(&self) -> u32;

    /// Key of the body record.
    fn database_primary_index(&self) -> Result<Hash, Self::Error>;

    /// Optional alternate key (e.g. the ledger key MR) resolving to the
    /// primary index.
    fn database_secondary_index(&self) -> Result<Option<Hash>, Self::Error>;

    fn marshal_binary(&self) -> Result<Vec<u8>, Self::Error>;

    fn unmarshal_binary(data: &[u8]) -> Result<Self, Self::Error>;
}
