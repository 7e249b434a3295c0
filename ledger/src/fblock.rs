//! Factoid block.
//!
//! Binary layout (big-endian):
//!
//! ```text
//! 32B   chain_id (always FACTOID_CHAIN_ID)
//! 32B   body_mr
//! 32B   prev_key_mr
//! 32B   prev_ledger_key_mr
//! 8B    exchange_rate
//! 4B    db_height
//! 4B    tx_count
//! ...   tx_count x (u32 length ++ transaction bytes)
//! ```
//!
//! The header is everything up to and including `tx_count`.

use fedchain_crypto::{sha256, sha256_multi};
use fedchain_protocol::{Encode, EncodeError, Reader, Writer};
use fedchain_store::DatabaseBatchable;
use fedchain_types::Hash;

use crate::LedgerError;

/// The Factoid chain: 31 zero bytes followed by `0x0f`.
pub const FACTOID_CHAIN_ID: Hash = {
    let mut bytes = [0u8; 32];
    bytes[31] = 0x0f;
    Hash::new(bytes)
};

const HEADER_LEN: usize = 4 * Hash::LEN + 8 + 4 + 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FBlock {
    body_mr: Hash,
    prev_key_mr: Hash,
    prev_ledger_key_mr: Hash,
    exchange_rate: u64,
    db_height: u32,
    transactions: Vec<Vec<u8>>,
}

impl FBlock {
    pub fn new(
        prev_key_mr: Hash,
        prev_ledger_key_mr: Hash,
        exchange_rate: u64,
        db_height: u32,
        transactions: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            body_mr: compute_body_mr(&transactions),
            prev_key_mr,
            prev_ledger_key_mr,
            exchange_rate,
            db_height,
            transactions,
        }
    }

    pub fn chain_id(&self) -> Hash {
        FACTOID_CHAIN_ID
    }

    pub fn body_mr(&self) -> Hash {
        self.body_mr
    }

    pub fn prev_key_mr(&self) -> Hash {
        self.prev_key_mr
    }

    pub fn prev_ledger_key_mr(&self) -> Hash {
        self.prev_ledger_key_mr
    }

    pub fn exchange_rate(&self) -> u64 {
        self.exchange_rate
    }

    pub fn db_height(&self) -> u32 {
        self.db_height
    }

    pub fn transactions(&self) -> &[Vec<u8>] {
        &self.transactions
    }

    pub fn header_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(HEADER_LEN);
        self.write_header(&mut w);
        w.into_bytes()
    }

    /// `sha256(sha256(header) ++ body_mr)`.
    pub fn key_mr(&self) -> Hash {
        let header_hash = sha256(&self.header_bytes());
        sha256_multi(&[header_hash.as_bytes(), self.body_mr.as_bytes()])
    }

    /// `sha256(prev_ledger_key_mr ++ body_mr ++ db_height)`.
    pub fn ledger_key_mr(&self) -> Hash {
        sha256_multi(&[
            self.prev_ledger_key_mr.as_bytes(),
            self.body_mr.as_bytes(),
            &self.db_height.to_be_bytes(),
        ])
    }

    pub fn marshal_binary(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(self.to_bytes()?)
    }

    /// Decode a complete block, checking the chain ID and body MR.
    pub fn unmarshal_binary(data: &[u8]) -> Result<Self, LedgerError> {
        let mut r = Reader::new(data);

        let chain_id = Hash::new(r.read_array("chain_id")?);
        if chain_id != FACTOID_CHAIN_ID {
            return Err(LedgerError::WrongChain {
                expected: FACTOID_CHAIN_ID,
                found: chain_id,
            });
        }
        let body_mr = Hash::new(r.read_array("body_mr")?);
        let prev_key_mr = Hash::new(r.read_array("prev_key_mr")?);
        let prev_ledger_key_mr = Hash::new(r.read_array("prev_ledger_key_mr")?);
        let exchange_rate = r.read_u64("exchange_rate")?;
        let db_height = r.read_u32("db_height")?;
        let tx_count = r.read_u32("tx_count")? as usize;

        // Each transaction needs at least its 4-byte length.
        let mut transactions = Vec::with_capacity(tx_count.min(r.remaining() / 4));
        for _ in 0..tx_count {
            transactions.push(r.read_var_bytes("transaction")?);
        }
        if !r.is_empty() {
            return Err(fedchain_protocol::DecodeError::TrailingBytes(r.remaining()).into());
        }

        let computed = compute_body_mr(&transactions);
        if computed != body_mr {
            return Err(LedgerError::BodyMismatch {
                stored: body_mr,
                computed,
            });
        }

        Ok(Self {
            body_mr,
            prev_key_mr,
            prev_ledger_key_mr,
            exchange_rate,
            db_height,
            transactions,
        })
    }

    fn write_header(&self, w: &mut Writer) {
        w.write_bytes(FACTOID_CHAIN_ID.as_bytes());
        w.write_bytes(self.body_mr.as_bytes());
        w.write_bytes(self.prev_key_mr.as_bytes());
        w.write_bytes(self.prev_ledger_key_mr.as_bytes());
        w.write_u64(self.exchange_rate);
        w.write_u32(self.db_height);
        w.write_u32(self.transactions.len() as u32);
    }
}

fn compute_body_mr(transactions: &[Vec<u8>]) -> Hash {
    let leaves: Vec<Hash> = transactions.iter().map(|tx| sha256(tx)).collect();
    let parts: Vec<&[u8]> = leaves.iter().map(|h| h.as_bytes().as_slice()).collect();
    sha256_multi(&parts)
}

impl Encode for FBlock {
    fn encode(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        self.write_header(writer);
        for tx in &self.transactions {
            writer.write_var_bytes("transaction", tx)?;
        }
        Ok(())
    }
}

impl DatabaseBatchable for FBlock {
    type Error = LedgerError;

    fn chain_id(&self) -> Hash {
        FACTOID_CHAIN_ID
    }

    fn database_height(&self) -> u32 {
        self.db_height
    }

    fn database_primary_index(&self) -> Result<Hash, LedgerError> {
        Ok(self.key_mr())
    }

    fn database_secondary_index(&self) -> Result<Option<Hash>, LedgerError> {
        Ok(Some(self.ledger_key_mr()))
    }

    fn marshal_binary(&self) -> Result<Vec<u8>, LedgerError> {
        FBlock::marshal_binary(self)
    }

    fn unmarshal_binary(data: &[u8]) -> Result<Self, LedgerError> {
        FBlock::unmarshal_binary(data)
    }
}
