//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Transactions (signed account transfers, coinbase rewards)
//! - Blocks (hash-linked, proof of work, fixed genesis)
//! - Ledger (chain + pending pool, validation, longest-chain replacement)

pub mod block;
pub mod ledger;
pub mod transaction;

pub use block::{compute_hash, Block, BlockData, GENESIS_DATA, GENESIS_HASH};
pub use ledger::{
    check_block, check_chain, check_transfer, Ledger, ValidationError, DEFAULT_DIFFICULTY,
};
pub use transaction::{SignedTransaction, Transaction, COINBASE_ADDRESS};
