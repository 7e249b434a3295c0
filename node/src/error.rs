use fedchain_types::Hash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("decode error: {0}")]
    Decode(#[from] fedchain_protocol::DecodeError),

    #[error("message error: {0}")]
    Message(#[from] fedchain_messages::MessageError),

    #[error("consensus error: {0}")]
    Consensus(#[from] fedchain_consensus::ConsensusError),

    #[error("ledger error: {0}")]
    Ledger(#[from] fedchain_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] fedchain_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] fedchain_store_lmdb::LmdbError),

    #[error("chain {0} is halted after a storage failure")]
    ChainHalted(Hash),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
