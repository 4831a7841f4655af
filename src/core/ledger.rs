//! In-memory ledger
//!
//! Holds the chain of blocks and the pool of pending transactions. All
//! operations are pure state transitions; the ledger never touches the
//! network. Every rejection carries a [`ValidationError`] so callers can
//! tell the reasons apart, while the `validate_*`/`is_*` helpers collapse
//! them to a boolean.

use crate::core::block::Block;
use crate::core::transaction::SignedTransaction;
use thiserror::Error;

/// Default mining difficulty (number of leading zero hex characters)
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Reasons a block, chain or transaction is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid index: expected {expected}, got {got}")]
    IndexMismatch { expected: u64, got: u64 },
    #[error("Timestamp {got} is earlier than previous block timestamp {previous}")]
    TimestampRegression { previous: i64, got: i64 },
    #[error("Previous hash does not match the tip")]
    PreviousHashMismatch,
    #[error("Block hash does not match its contents")]
    HashMismatch,
    #[error("Block hash does not meet difficulty {0}")]
    DifficultyMismatch(usize),
    #[error("First block is not the genesis block")]
    InvalidGenesis,
    #[error("Chain is empty")]
    EmptyChain,
    #[error("Invalid transaction signature")]
    BadSignature,
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: i128, need: u64 },
    #[error("Transaction already pending")]
    DuplicateTransaction,
    #[error("Candidate chain holds only the genesis block")]
    ChainTooShort,
    #[error("Candidate chain length {candidate} is not longer than {current}")]
    ChainNotLonger { candidate: usize, current: usize },
    #[error("Candidate chain invalid at block {index}: {reason}")]
    ChainInvalid {
        index: usize,
        reason: Box<ValidationError>,
    },
}

/// Validate `block` as the successor of `previous`.
/// Checks run in a fixed order and stop at the first failure.
pub fn check_block(
    block: &Block,
    previous: &Block,
    difficulty: usize,
) -> Result<(), ValidationError> {
    if previous.index + 1 != block.index {
        return Err(ValidationError::IndexMismatch {
            expected: previous.index + 1,
            got: block.index,
        });
    }
    if previous.timestamp > block.timestamp {
        return Err(ValidationError::TimestampRegression {
            previous: previous.timestamp,
            got: block.timestamp,
        });
    }
    if previous.hash != block.previous_hash {
        return Err(ValidationError::PreviousHashMismatch);
    }
    if !block.verify_hash() {
        return Err(ValidationError::HashMismatch);
    }
    if !block.is_valid_pow(difficulty) {
        return Err(ValidationError::DifficultyMismatch(difficulty));
    }
    Ok(())
}

/// Validate a whole chain starting from the fixed genesis block
pub fn check_chain(chain: &[Block], difficulty: usize) -> Result<(), ValidationError> {
    let first = chain.first().ok_or(ValidationError::EmptyChain)?;
    if !first.is_genesis() {
        return Err(ValidationError::InvalidGenesis);
    }
    for (i, pair) in chain.windows(2).enumerate() {
        check_block(&pair[1], &pair[0], difficulty).map_err(|reason| {
            ValidationError::ChainInvalid {
                index: i + 1,
                reason: Box::new(reason),
            }
        })?;
    }
    Ok(())
}

/// Validate a single transfer (coinbase always passes)
pub fn check_transfer(tx: &SignedTransaction) -> Result<(), ValidationError> {
    if tx.verify_signature() {
        Ok(())
    } else {
        Err(ValidationError::BadSignature)
    }
}

/// Chain plus pending pool
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<SignedTransaction>,
    difficulty: usize,
}

impl Ledger {
    /// Create a ledger holding only the genesis block
    pub fn new() -> Self {
        Self::with_difficulty(DEFAULT_DIFFICULTY)
    }

    /// Create a ledger with custom difficulty
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            difficulty,
        }
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[SignedTransaction] {
        &self.pending
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Number of blocks including genesis
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Get the latest block
    pub fn tip(&self) -> &Block {
        // The chain is never empty: it starts at genesis and is only ever
        // replaced by a validated chain that begins with genesis.
        &self.chain[self.chain.len() - 1]
    }

    pub fn check_block(&self, block: &Block, previous: &Block) -> Result<(), ValidationError> {
        check_block(block, previous, self.difficulty)
    }

    pub fn validate_block(&self, block: &Block, previous: &Block) -> bool {
        self.check_block(block, previous).is_ok()
    }

    pub fn check_chain(&self, chain: &[Block]) -> Result<(), ValidationError> {
        check_chain(chain, self.difficulty)
    }

    pub fn validate_chain(&self, chain: &[Block]) -> bool {
        self.check_chain(chain).is_ok()
    }

    pub fn is_valid_transfer(&self, tx: &SignedTransaction) -> bool {
        check_transfer(tx).is_ok()
    }

    /// Validate then append a transaction to the pending pool.
    /// A structurally identical transaction is only pooled once.
    pub fn add_transaction(&mut self, tx: SignedTransaction) -> Result<(), ValidationError> {
        if self.contains_pending(&tx) {
            return Err(ValidationError::DuplicateTransaction);
        }
        check_transfer(&tx)?;
        self.pending.push(tx);
        Ok(())
    }

    /// Append a coinbase or otherwise pre-checked transaction
    pub(crate) fn push_pending(&mut self, tx: SignedTransaction) {
        self.pending.push(tx);
    }

    pub fn contains_pending(&self, tx: &SignedTransaction) -> bool {
        self.pending.contains(tx)
    }

    /// Append a block the caller has already validated against the tip,
    /// clearing the pending pool
    pub fn append_block(&mut self, block: Block) {
        self.chain.push(block);
        self.pending.clear();
    }

    /// Validate `block` against the tip and append it
    pub fn submit_block(&mut self, block: Block) -> Result<(), ValidationError> {
        self.check_block(&block, self.tip())?;
        self.append_block(block);
        Ok(())
    }

    /// Longest-valid-chain rule: adopt `candidate` only if it is strictly
    /// longer, holds more than genesis, and validates end to end
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> Result<(), ValidationError> {
        if candidate.len() <= 1 {
            return Err(ValidationError::ChainTooShort);
        }
        if candidate.len() <= self.chain.len() {
            return Err(ValidationError::ChainNotLonger {
                candidate: candidate.len(),
                current: self.chain.len(),
            });
        }
        self.check_chain(&candidate)?;

        log::info!(
            "Replacing chain of length {} with length {}",
            self.chain.len(),
            candidate.len()
        );
        self.chain = candidate;
        Ok(())
    }

    /// Replace the pending pool wholesale if every transaction is valid
    pub fn replace_pending(
        &mut self,
        candidate: Vec<SignedTransaction>,
    ) -> Result<(), ValidationError> {
        candidate.iter().try_for_each(check_transfer)?;
        self.pending = candidate;
        Ok(())
    }

    /// Net balance of `address` over every confirmed block.
    /// Linear in the total number of confirmed transactions. Amounts are
    /// widened to `i128` and summed saturating, so no chain a peer can
    /// build makes this wrap or panic.
    pub fn balance(&self, address: &str) -> i128 {
        self.chain
            .iter()
            .filter_map(|block| block.data.transactions())
            .flatten()
            .fold(0i128, |balance, tx| {
                let amount = i128::from(tx.amount);
                let mut balance = balance;
                if tx.from == address {
                    balance = balance.saturating_sub(amount);
                }
                if tx.to == address {
                    balance = balance.saturating_add(amount);
                }
                balance
            })
    }

    /// Confirmed transactions sent from or paid to `address`
    pub fn history(&self, address: &str) -> Vec<&SignedTransaction> {
        self.chain
            .iter()
            .filter_map(|block| block.data.transactions())
            .flatten()
            .filter(|tx| tx.from == address || tx.to == address)
            .collect()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an unmined candidate on top of `tip`; used by tests across modules
#[cfg(test)]
pub(crate) fn mine_on(tip: &Block, txs: Vec<SignedTransaction>, difficulty: usize) -> Block {
    let data = crate::core::block::BlockData::Transactions(txs);
    let mut nonce = 0;
    loop {
        let timestamp = tip.timestamp + 1;
        let hash =
            crate::core::block::compute_hash(tip.index + 1, &tip.hash, timestamp, &data, nonce);
        if crate::crypto::meets_difficulty(&hash, difficulty) {
            return Block {
                index: tip.index + 1,
                previous_hash: tip.hash.clone(),
                timestamp,
                nonce,
                hash,
                data,
            };
        }
        nonce += 1;
    }
}
