//! Mining engine for the ledger
//!
//! Proof of work walks the nonce upward from zero and takes a fresh
//! timestamp on every attempt until the block hash carries the required
//! number of leading zero hex digits. The search is unbounded.

use crate::core::{
    compute_hash, Block, BlockData, Ledger, SignedTransaction, Transaction, ValidationError,
};
use crate::crypto::meets_difficulty;
use chrono::Utc;
use log::info;
use std::convert::Infallible;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Block reward in coins
pub const BLOCK_REWARD: u64 = 100;

/// Mining errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MiningError {
    #[error("Invalid pending transaction at position {0}")]
    InvalidPendingTransaction(usize),
    #[error("Mined block rejected: {0}")]
    InvalidBlock(#[from] ValidationError),
}

/// Mining statistics
#[derive(Debug, Clone)]
pub struct MiningStats {
    /// Number of hash attempts
    pub hash_attempts: u64,
    /// Time taken in milliseconds
    pub time_ms: u128,
    /// Hash rate (hashes per second)
    pub hash_rate: f64,
}

impl MiningStats {
    fn new(hash_attempts: u64, start: Instant) -> Self {
        let time_ms = start.elapsed().as_millis();
        let hash_rate = if time_ms > 0 {
            (hash_attempts as f64) / (time_ms as f64 / 1000.0)
        } else {
            hash_attempts as f64
        };
        Self {
            hash_attempts,
            time_ms,
            hash_rate,
        }
    }
}

/// Everything needed to search for a block, detached from the ledger
#[derive(Debug, Clone)]
pub struct MiningJob {
    pub index: u64,
    pub previous_hash: String,
    pub difficulty: usize,
    pub data: BlockData,
}

impl MiningJob {
    /// Snapshot the tip of `ledger` with the given block contents
    pub fn new(ledger: &Ledger, transactions: Vec<SignedTransaction>) -> Self {
        let tip = ledger.tip();
        Self {
            index: tip.index + 1,
            previous_hash: tip.hash.clone(),
            difficulty: ledger.difficulty(),
            data: BlockData::Transactions(transactions),
        }
    }

    /// Run the proof-of-work search. Returns `None` if `cancel` fires
    /// before a block is found.
    pub fn run(self, cancel: Option<&CancellationToken>) -> Option<(Block, MiningStats)> {
        let Some(token) = cancel else {
            return Some(self.solve());
        };

        let index = self.index;
        let checked = self.search(|attempts| {
            if token.is_cancelled() {
                Err(attempts)
            } else {
                Ok(())
            }
        });
        match checked {
            Ok(found) => Some(found),
            Err(attempts) => {
                info!("Mining of block {} cancelled after {} attempts", index, attempts);
                None
            }
        }
    }

    /// Search until a block is found
    pub fn solve(self) -> (Block, MiningStats) {
        match self.search(|_| Ok::<(), Infallible>(())) {
            Ok(found) => found,
            Err(never) => match never {},
        }
    }

    /// Nonce search; `check` runs before every attempt and may abort it
    fn search<E>(
        self,
        mut check: impl FnMut(u64) -> Result<(), E>,
    ) -> Result<(Block, MiningStats), E> {
        let start = Instant::now();
        info!(
            "Mining block {} with difficulty {}...",
            self.index, self.difficulty
        );

        let mut nonce = 0u64;
        let (timestamp, hash) = loop {
            check(nonce)?;

            let timestamp = Utc::now().timestamp_millis();
            let hash = compute_hash(
                self.index,
                &self.previous_hash,
                timestamp,
                &self.data,
                nonce,
            );
            if meets_difficulty(&hash, self.difficulty) {
                break (timestamp, hash);
            }
            nonce += 1;
        };

        let stats = MiningStats::new(nonce + 1, start);
        info!(
            "Block {} mined in {}ms ({} attempts, {:.2} H/s)",
            self.index, stats.time_ms, stats.hash_attempts, stats.hash_rate
        );

        let block = Block {
            index: self.index,
            previous_hash: self.previous_hash,
            timestamp,
            nonce,
            hash,
            data: self.data,
        };
        Ok((block, stats))
    }
}

/// Miner for creating new blocks
pub struct Miner {
    /// Miner's address for receiving rewards
    pub address: String,
}

impl Miner {
    /// Create a new miner
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }

    /// Reward transaction paying this miner
    pub fn coinbase(&self) -> SignedTransaction {
        Transaction::coinbase(&self.address, BLOCK_REWARD).into_unsigned()
    }

    /// Every pending transaction must be individually valid before mining
    pub fn check_pending(&self, ledger: &Ledger) -> Result<(), MiningError> {
        match ledger
            .pending()
            .iter()
            .position(|tx| !ledger.is_valid_transfer(tx))
        {
            Some(position) => Err(MiningError::InvalidPendingTransaction(position)),
            None => Ok(()),
        }
    }

    /// Search for a block holding the current pending pool on top of the tip
    pub fn create_block(&self, ledger: &Ledger) -> (Block, MiningStats) {
        MiningJob::new(ledger, ledger.pending().to_vec()).solve()
    }

    /// Mine a block paying the reward to this miner and append it
    pub fn mine(&self, ledger: &mut Ledger) -> Result<(Block, MiningStats), MiningError> {
        self.check_pending(ledger)?;

        ledger.push_pending(self.coinbase());
        let (block, stats) = self.create_block(ledger);

        ledger.check_block(&block, ledger.tip())?;
        ledger.append_block(block.clone());
        Ok((block, stats))
    }

    /// Build a job for mining off the ledger's thread. The ledger is not
    /// touched: the coinbase only exists inside the job.
    pub fn prepare(&self, ledger: &Ledger) -> Result<MiningJob, MiningError> {
        self.check_pending(ledger)?;

        let mut transactions = ledger.pending().to_vec();
        transactions.push(self.coinbase());
        Ok(MiningJob::new(ledger, transactions))
    }
}
