//! Bucket tags: the on-disk namespace.
//!
//! Tag values are persisted as key prefixes and must never be renumbered.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Bucket {
    DirectoryBlock = 0,
    DirectoryBlockNumber = 1,
    DirectoryBlockKeyMr = 2,
    AdminBlock = 3,
    AdminBlockNumber = 4,
    AdminBlockKeyMr = 5,
    FactoidBlock = 6,
    FactoidBlockNumber = 7,
    FactoidBlockKeyMr = 8,
    EntryCreditBlock = 9,
    EntryCreditBlockNumber = 10,
    EntryCreditBlockKeyMr = 11,
    EntryBlock = 12,
    EntryBlockNumber = 13,
    EntryBlockKeyMr = 14,
    Entry = 15,
    /// Chain ID -> primary index of the chain's head block.
    ChainHead = 16,
}

impl Bucket {
    pub const ALL: [Bucket; 17] = [
        Bucket::DirectoryBlock,
        Bucket::DirectoryBlockNumber,
        Bucket::DirectoryBlockKeyMr,
        Bucket::AdminBlock,
        Bucket::AdminBlockNumber,
        Bucket::AdminBlockKeyMr,
        Bucket::FactoidBlock,
        Bucket::FactoidBlockNumber,
        Bucket::FactoidBlockKeyMr,
        Bucket::EntryCreditBlock,
        Bucket::EntryCreditBlockNumber,
        Bucket::EntryCreditBlockKeyMr,
        Bucket::EntryBlock,
        Bucket::EntryBlockNumber,
        Bucket::EntryBlockKeyMr,
        Bucket::Entry,
        Bucket::ChainHead,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectoryBlock => "dblock",
            Self::DirectoryBlockNumber => "dblock_number",
            Self::DirectoryBlockKeyMr => "dblock_keymr",
            Self::AdminBlock => "ablock",
            Self::AdminBlockNumber => "ablock_number",
            Self::AdminBlockKeyMr => "ablock_keymr",
            Self::FactoidBlock => "fblock",
            Self::FactoidBlockNumber => "fblock_number",
            Self::FactoidBlockKeyMr => "fblock_keymr",
            Self::EntryCreditBlock => "ecblock",
            Self::EntryCreditBlockNumber => "ecblock_number",
            Self::EntryCreditBlockKeyMr => "ecblock_keymr",
            Self::EntryBlock => "eblock",
            Self::EntryBlockNumber => "eblock_number",
            Self::EntryBlockKeyMr => "eblock_keymr",
            Self::Entry => "entry",
            Self::ChainHead => "chain_head",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three buckets owned by one block type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockBuckets {
    /// Body, keyed by primary index.
    pub block: Bucket,
    /// Height (4-byte big-endian) -> primary index.
    pub number: Bucket,
    /// Secondary index (key MR) -> primary index.
    pub key_mr: Bucket,
}

impl BlockBuckets {
    pub const DIRECTORY_BLOCK: Self = Self {
        block: Bucket::DirectoryBlock,
        number: Bucket::DirectoryBlockNumber,
        key_mr: Bucket::DirectoryBlockKeyMr,
    };
    pub const ADMIN_BLOCK: Self = Self {
        block: Bucket::AdminBlock,
        number: Bucket::AdminBlockNumber,
        key_mr: Bucket::AdminBlockKeyMr,
    };
    pub const FACTOID_BLOCK: Self = Self {
        block: Bucket::FactoidBlock,
        number: Bucket::FactoidBlockNumber,
        key_mr: Bucket::FactoidBlockKeyMr,
    };
    pub const ENTRY_CREDIT_BLOCK: Self = Self {
        block: Bucket::EntryCreditBlock,
        number: Bucket::EntryCreditBlockNumber,
        key_mr: Bucket::EntryCreditBlockKeyMr,
    };
    pub const ENTRY_BLOCK: Self = Self {
        block: Bucket::EntryBlock,
        number: Bucket::EntryBlockNumber,
        key_mr: Bucket::EntryBlockKeyMr,
    };
}
