//! The fedchain node: opens storage and wires the message processor and the
//! block acceptor to a shared state machine and metrics registry.

use std::sync::Arc;

use fedchain_ledger::FBlock;
use fedchain_messages::NodeState;
use fedchain_store::Overlay;
use fedchain_store_lmdb::LmdbEnvironment;
use tracing::info;

use crate::block_acceptor::BlockAcceptor;
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::message_processor::{MessageProcessor, ProcessOutcome};
use crate::metrics::NodeMetrics;

pub struct FedNode {
    config: NodeConfig,
    metrics: Arc<NodeMetrics>,
    overlay: Arc<Overlay<LmdbEnvironment>>,
    processor: MessageProcessor,
    acceptor: BlockAcceptor<LmdbEnvironment>,
}

impl FedNode {
    /// Open the LMDB environment under `config.data_dir` and build the
    /// processing pipeline around `state`.
    pub fn open(
        config: NodeConfig,
        state: Arc<dyn NodeState + Send + Sync>,
    ) -> Result<Self, NodeError> {
        let env = LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)?;
        let overlay = Arc::new(Overlay::new(env));
        let metrics = Arc::new(NodeMetrics::new());

        let processor = MessageProcessor::new(
            state,
            config.role,
            config.max_deferred,
            Arc::clone(&metrics),
        );
        let acceptor = BlockAcceptor::new(Arc::clone(&overlay), Arc::clone(&metrics));

        info!(
            data_dir = %config.data_dir.display(),
            role = ?config.role,
            max_deferred = config.max_deferred,
            "fedchain node opened"
        );

        Ok(Self {
            config,
            metrics,
            overlay,
            processor,
            acceptor,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn overlay(&self) -> &Overlay<LmdbEnvironment> {
        &self.overlay
    }

    pub fn processor(&self) -> &MessageProcessor {
        &self.processor
    }

    pub fn acceptor(&self) -> &BlockAcceptor<LmdbEnvironment> {
        &self.acceptor
    }

    // ── Shortcuts ───────────────────────────────────────────────────────

    pub fn receive(&self, bytes: &[u8]) -> Result<ProcessOutcome, NodeError> {
        self.processor.process_bytes(bytes)
    }

    pub fn accept_fblock(&self, block: &FBlock) -> Result<(), NodeError> {
        self.acceptor.accept_fblock(block)
    }

    pub fn factoid_head(&self) -> Result<Option<FBlock>, NodeError> {
        self.acceptor.factoid_head()
    }

    /// Prometheus text exposition, or `None` when metrics are disabled.
    pub fn metrics_text(&self) -> Result<Option<String>, NodeError> {
        if !self.config.enable_metrics {
            return Ok(None);
        }
        self.metrics.encode_text().map(Some)
    }
}
