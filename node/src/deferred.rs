//! Bounded holding area for messages whose signer set is not yet known.
//!
//! Messages are revalidated in arrival order. When the queue is full the
//! oldest entry is evicted to make room.

use std::collections::VecDeque;

use fedchain_messages::Message;

pub const DEFAULT_MAX_DEFERRED: usize = 4096;

pub struct DeferredQueue {
    entries: VecDeque<Message>,
    max_size: usize,
}

/// What happened to a message offered to the queue.
#[derive(Debug, PartialEq, Eq)]
pub enum DeferOutcome {
    Queued,
    /// An identical message was already waiting.
    Duplicate,
    /// Queued after dropping the oldest waiting message.
    Evicted(Message),
}

impl DeferredQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    pub fn with_default_size() -> Self {
        Self::new(DEFAULT_MAX_DEFERRED)
    }

    pub fn push(&mut self, message: Message) -> DeferOutcome {
        if self.entries.iter().any(|m| m.is_same_as(&message)) {
            return DeferOutcome::Duplicate;
        }
        let evicted = if self.entries.len() >= self.max_size {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(message);
        match evicted {
            Some(old) => DeferOutcome::Evicted(old),
            None => DeferOutcome::Queued,
        }
    }

    /// Take every waiting message, oldest first.
    pub fn drain(&mut self) -> Vec<Message> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
