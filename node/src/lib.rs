//! fedchain node: takes raw fault messages off the wire, validates them
//! against the federated state machine, and persists accepted blocks.

pub mod block_acceptor;
pub mod config;
pub mod deferred;
pub mod error;
pub mod logging;
pub mod message_processor;
pub mod metrics;
pub mod node;

pub use block_acceptor::BlockAcceptor;
pub use config::NodeConfig;
pub use deferred::{DeferOutcome, DeferredQueue};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use message_processor::{MessageProcessor, ProcessOutcome, RetrySummary, Role};
pub use metrics::NodeMetrics;
pub use node::FedNode;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
