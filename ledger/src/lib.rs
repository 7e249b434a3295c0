//! Ledger blocks and their persistence.
//!
//! [`FBlock`] is the Factoid (value transfer) block. It is persisted through
//! the generic [`Overlay`](fedchain_store::Overlay) under the Factoid bucket
//! group; [`FBlockStore`] adds the typed entry points.

pub mod error;
pub mod fblock;
pub mod fblock_store;

pub use error::LedgerError;
pub use fblock::{FBlock, FACTOID_CHAIN_ID};
pub use fblock_store::FBlockStore;
