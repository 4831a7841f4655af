//! Block implementation for the ledger
//!
//! A block links to its predecessor by hash and carries either the fixed
//! genesis marker or a list of signed transactions.

use crate::core::transaction::SignedTransaction;
use crate::crypto::{meets_difficulty, sha256_hex};
use serde::{Deserialize, Serialize};

// =============================================================================
// Genesis
// =============================================================================

/// Placeholder payload of the genesis block
pub const GENESIS_DATA: &str = "Welcome to Block Chain";

/// Genesis creation time (ms since the epoch)
pub const GENESIS_TIMESTAMP: i64 = 1_710_649_178_570;

/// Nonce that gives the genesis block four leading zero hex digits
pub const GENESIS_NONCE: u64 = 77_461;

/// Precomputed genesis hash
pub const GENESIS_HASH: &str = "00004676ec5b7713f5e6bdc25f9f158b4b4d29dd32838f3935d990ecf5d822a9";

// =============================================================================
// Block
// =============================================================================

/// Block payload: the genesis marker or a transaction list.
/// Serialized untagged so the hash input is a bare JSON string or array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockData {
    Transactions(Vec<SignedTransaction>),
    Genesis(String),
}

impl BlockData {
    /// Transactions carried by the block, if any
    pub fn transactions(&self) -> Option<&[SignedTransaction]> {
        match self {
            BlockData::Transactions(txs) => Some(txs),
            BlockData::Genesis(_) => None,
        }
    }

    /// Canonical JSON form used as hash input
    fn canonical(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A block in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block index/height
    pub index: u64,
    /// Hash of the previous block
    pub previous_hash: String,
    /// Creation time in milliseconds since the epoch
    pub timestamp: i64,
    /// Nonce found by proof of work
    pub nonce: u64,
    /// Block hash
    pub hash: String,
    pub data: BlockData,
}

/// Hash the block fields in their canonical concatenated form
pub fn compute_hash(
    index: u64,
    previous_hash: &str,
    timestamp: i64,
    data: &BlockData,
    nonce: u64,
) -> String {
    let input = format!(
        "{}{}{}{}{}",
        index,
        previous_hash,
        timestamp,
        data.canonical(),
        nonce
    );
    sha256_hex(input.as_bytes())
}

impl Block {
    /// The fixed first block of every valid chain
    pub fn genesis() -> Self {
        Self {
            index: 0,
            previous_hash: "0".to_string(),
            timestamp: GENESIS_TIMESTAMP,
            nonce: GENESIS_NONCE,
            hash: GENESIS_HASH.to_string(),
            data: BlockData::Genesis(GENESIS_DATA.to_string()),
        }
    }

    /// Recompute the hash from the block's own fields
    pub fn compute_hash(&self) -> String {
        compute_hash(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.data,
            self.nonce,
        )
    }

    /// Verify the stored block hash
    pub fn verify_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Check if the proof of work is valid
    pub fn is_valid_pow(&self, difficulty: usize) -> bool {
        meets_difficulty(&self.hash, difficulty)
    }

    pub fn is_genesis(&self) -> bool {
        *self == Self::genesis()
    }

    /// Get number of transactions in this block
    pub fn tx_count(&self) -> usize {
        self.data.transactions().map_or(0, <[_]>::len)
    }
}
