//! Message intake: decode, validate, then hand accepted messages to the
//! state machine.
//!
//! Validation outcomes map onto three paths:
//! - `Valid`: executed according to the node's [`Role`].
//! - `Pending`: parked in a [`DeferredQueue`] until [`MessageProcessor::retry_deferred`].
//! - `Invalid`: dropped.
//!
//! Batches are decoded and signature-checked on the rayon pool; the state
//! machine itself is only ever called from the submitting thread, in input
//! order.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use fedchain_consensus::FaultTally;
use fedchain_messages::{
    decode_message, FaultKey, FullServerFault, Message, NodeState, ProtocolMessage,
    ValidationResult,
};
use fedchain_protocol::DecodeError;
use fedchain_types::{KeyPair, Timestamp};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::deferred::{DeferOutcome, DeferredQueue};
use crate::{lock_unpoisoned, NodeError, NodeMetrics};

/// Which execution path accepted messages take.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    #[default]
    Follower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    Executed,
    Deferred,
    Rejected,
}

impl From<ValidationResult> for ProcessOutcome {
    fn from(result: ValidationResult) -> Self {
        match result {
            ValidationResult::Valid => Self::Executed,
            ValidationResult::Pending => Self::Deferred,
            ValidationResult::Invalid => Self::Rejected,
        }
    }
}

/// Counts from one pass over the deferred queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetrySummary {
    pub executed: usize,
    pub rejected: usize,
    pub still_deferred: usize,
}

pub struct MessageProcessor {
    state: Arc<dyn NodeState + Send + Sync>,
    role: Role,
    deferred: Mutex<DeferredQueue>,
    tally: Mutex<FaultTally>,
    metrics: Arc<NodeMetrics>,
}

impl MessageProcessor {
    pub fn new(
        state: Arc<dyn NodeState + Send + Sync>,
        role: Role,
        max_deferred: usize,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self {
            state,
            role,
            deferred: Mutex::new(DeferredQueue::new(max_deferred)),
            tally: Mutex::new(FaultTally::new()),
            metrics,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    // ── Intake ──────────────────────────────────────────────────────────

    /// Decode one raw message and run it through validation.
    pub fn process_bytes(&self, bytes: &[u8]) -> Result<ProcessOutcome, NodeError> {
        self.metrics.messages_received.inc();
        let message = decode_message(bytes).map_err(|e| self.decode_failed(e))?;
        Ok(self.process_message(message))
    }

    pub fn process_message(&self, message: Message) -> ProcessOutcome {
        let result = message.validate(self.state.as_ref());
        self.settle(message, result)
    }

    /// Process a message whose `verify_signature` already returned
    /// `Ok(true)`, skipping the repeated local signature check.
    fn process_prechecked(&self, message: Message) -> ProcessOutcome {
        let result = message.validate_prechecked(self.state.as_ref());
        self.settle(message, result)
    }

    fn settle(&self, message: Message, result: ValidationResult) -> ProcessOutcome {
        match result {
            ValidationResult::Valid => {
                self.metrics.messages_valid.inc();
                self.execute(&message);
            }
            ValidationResult::Pending => self.defer(message),
            ValidationResult::Invalid => {
                self.metrics.messages_invalid.inc();
                debug!(
                    kind = %message.message_type(),
                    db_height = message.db_height(),
                    "dropping invalid message"
                );
            }
        }
        result.into()
    }

    /// Process a batch of raw messages, returning one outcome per input in
    /// input order.
    ///
    /// Messages that fail to decode or whose own signature does not verify
    /// never reach the state machine.
    pub fn process_batch<B>(&self, inputs: &[B]) -> Vec<Result<ProcessOutcome, NodeError>>
    where
        B: AsRef<[u8]> + Sync,
    {
        let start = Instant::now();
        self.metrics.messages_received.inc_by(inputs.len() as u64);

        let prechecked: Vec<Result<(Message, bool), DecodeError>> = inputs
            .par_iter()
            .map(|bytes| {
                let message = decode_message(bytes.as_ref())?;
                let signed_ok = matches!(message.verify_signature(), Ok(true));
                Ok((message, signed_ok))
            })
            .collect();

        let outcomes = prechecked
            .into_iter()
            .map(|checked| match checked {
                Err(e) => Err(self.decode_failed(e)),
                Ok((_, false)) => {
                    self.metrics.messages_invalid.inc();
                    Ok(ProcessOutcome::Rejected)
                }
                Ok((message, true)) => Ok(self.process_prechecked(message)),
            })
            .collect();

        self.metrics
            .batch_process_time_ms
            .observe(start.elapsed().as_secs_f64() * 1000.0);
        outcomes
    }

    /// Revalidate every deferred message once.
    ///
    /// Messages still pending go back on the queue in their original order.
    pub fn retry_deferred(&self) -> RetrySummary {
        let waiting = lock_unpoisoned(&self.deferred).drain();
        let mut summary = RetrySummary::default();
        let mut still_pending = Vec::new();

        for message in waiting {
            match message.validate(self.state.as_ref()) {
                ValidationResult::Valid => {
                    self.metrics.messages_valid.inc();
                    self.execute(&message);
                    summary.executed += 1;
                }
                ValidationResult::Invalid => {
                    self.metrics.messages_invalid.inc();
                    summary.rejected += 1;
                }
                ValidationResult::Pending => still_pending.push(message),
            }
        }

        let mut queue = lock_unpoisoned(&self.deferred);
        for message in still_pending {
            if let DeferOutcome::Evicted(_) = queue.push(message) {
                self.metrics.deferred_evicted.inc();
            }
        }
        summary.still_deferred = queue.len();
        self.metrics.deferred_queue_len.set(queue.len() as i64);

        if summary.executed + summary.rejected > 0 {
            info!(
                executed = summary.executed,
                rejected = summary.rejected,
                still_deferred = summary.still_deferred,
                "retried deferred messages"
            );
        }
        summary
    }

    pub fn deferred_len(&self) -> usize {
        lock_unpoisoned(&self.deferred).len()
    }

    // ── Fault signatures ────────────────────────────────────────────────

    /// Distinct signers seen for a fault tuple.
    pub fn fault_signature_count(&self, key: &FaultKey) -> usize {
        lock_unpoisoned(&self.tally).signature_count(key)
    }

    /// Sign a full fault carrying every signature gathered for `key`.
    pub fn build_full_fault(
        &self,
        key: &FaultKey,
        timestamp: Timestamp,
        keypair: &KeyPair,
    ) -> Result<Option<FullServerFault>, NodeError> {
        Ok(lock_unpoisoned(&self.tally).build_full_fault(key, timestamp, keypair)?)
    }

    /// Forget a fault tuple; returns how many signatures were dropped.
    pub fn clear_fault(&self, key: &FaultKey) -> usize {
        let mut tally = lock_unpoisoned(&self.tally);
        let dropped = tally.remove(key).len();
        self.metrics.pending_fault_tuples.set(tally.len() as i64);
        dropped
    }

    pub fn prune_faults_below(&self, db_height: u32) -> usize {
        let mut tally = lock_unpoisoned(&self.tally);
        let pruned = tally.prune_below(db_height);
        self.metrics.pending_fault_tuples.set(tally.len() as i64);
        pruned
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn execute(&self, message: &Message) {
        match self.role {
            Role::Leader => message.leader_execute(self.state.as_ref()),
            Role::Follower => message.follower_execute(self.state.as_ref()),
        }
        self.metrics.faults_executed.inc();

        if let Message::ServerFault(fault) = message {
            let mut tally = lock_unpoisoned(&self.tally);
            match tally.record(fault) {
                Ok(count) => debug!(
                    server_id = %fault.server_id(),
                    db_height = fault.db_height(),
                    signatures = count,
                    "recorded fault signature"
                ),
                Err(e) => warn!(error = %e, "fault signature not recorded"),
            }
            self.metrics.pending_fault_tuples.set(tally.len() as i64);
        }
    }

    fn defer(&self, message: Message) {
        let mut queue = lock_unpoisoned(&self.deferred);
        match queue.push(message) {
            DeferOutcome::Queued => self.metrics.messages_deferred.inc(),
            DeferOutcome::Duplicate => {}
            DeferOutcome::Evicted(old) => {
                self.metrics.messages_deferred.inc();
                self.metrics.deferred_evicted.inc();
                warn!(
                    evicted = ?old.msg_hash(),
                    capacity = queue.max_size(),
                    "deferred queue full, dropped oldest message"
                );
            }
        }
        self.metrics.deferred_queue_len.set(queue.len() as i64);
    }

    fn decode_failed(&self, error: DecodeError) -> NodeError {
        self.metrics.decode_failures.inc();
        debug!(error = %error, "dropping undecodable message");
        error.into()
    }
}
