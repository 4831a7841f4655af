//! Gossip-Ledger: a minimal peer-to-peer ledger in Rust
//!
//! Every node keeps a full copy of a hash-linked chain of blocks and a pool
//! of pending transactions. Nodes find each other through a seed, flood
//! signed transactions and mined blocks over UDP, and converge by adopting
//! the longest valid chain they are offered.
//!
//! - Proof of Work (leading zero hex digits)
//! - ECDSA signatures (secp256k1) over account-to-account transfers
//! - Balances derived by replaying the chain
//! - Single-writer event loop with detached, cancellable mining
//!
//! # Example
//!
//! ```rust
//! use gossip_ledger::core::Ledger;
//! use gossip_ledger::mining::Miner;
//!
//! let mut ledger = Ledger::with_difficulty(1);
//! let miner = Miner::new("miner-address");
//!
//! let (block, stats) = miner.mine(&mut ledger).unwrap();
//! println!("Mined block {} in {}ms", block.index, stats.time_ms);
//!
//! assert_eq!(ledger.balance("miner-address"), 100);
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod network;
pub mod wallet;

// Re-export commonly used types
pub use core::{Block, BlockData, Ledger, SignedTransaction, Transaction, ValidationError};
pub use crypto::KeyPair;
pub use mining::{Miner, MiningStats, BLOCK_REWARD};
pub use network::{Message, Node, NodeConfig, NodeHandle, PeerInfo};
pub use wallet::KeyStore;
