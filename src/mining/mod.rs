//! Mining module for proof-of-work block creation

pub mod miner;

pub use miner::{Miner, MiningError, MiningJob, MiningStats, BLOCK_REWARD};
