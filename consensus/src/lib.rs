//! Consensus-side bookkeeping for server faults.
//!
//! Federated servers broadcast single-signer [`ServerFault`] accusations when
//! a VM leader stalls. Accusations arrive in any order and may be re-delivered.
//! [`FaultTally`] collects them per fault tuple so the outer state machine can
//! decide when enough have been seen and emit a [`FullServerFault`].
//!
//! [`ServerFault`]: fedchain_messages::ServerFault
//! [`FullServerFault`]: fedchain_messages::FullServerFault

pub mod error;
pub mod fault_tally;

pub use error::ConsensusError;
pub use fault_tally::FaultTally;
