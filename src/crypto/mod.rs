//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing and the leading-zero difficulty check
//! - ECDSA key management (secp256k1) and payload signing

pub mod hash;
pub mod keys;

pub use hash::{meets_difficulty, sha256, sha256_hex};
pub use keys::{public_key_from_hex, sign, verify, KeyError, KeyPair};
