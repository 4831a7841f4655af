//! Transaction handling for the ledger
//!
//! Account-style transfers signed by the sender. The sender address is the
//! hex encoded public key of its owner, so a signature can be checked
//! against the address alone. The sentinel address `"0"` mints coins.

use crate::crypto::{public_key_from_hex, verify, KeyError, KeyPair};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Sender address of coinbase (reward) transactions
pub const COINBASE_ADDRESS: &str = "0";

/// Unsigned transfer. Field order is the canonical signing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub amount: u64,
    /// Creation time in milliseconds since the epoch
    pub timestamp: i64,
}

impl Transaction {
    /// Create a transfer stamped with the current time
    pub fn new(from: &str, to: &str, amount: u64) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Create a coinbase transfer paying `to`
    pub fn coinbase(to: &str, amount: u64) -> Self {
        Self::new(COINBASE_ADDRESS, to, amount)
    }

    pub fn is_coinbase(&self) -> bool {
        self.from == COINBASE_ADDRESS
    }

    /// Attach a signature made with `key_pair`
    pub fn sign(self, key_pair: &KeyPair) -> Result<SignedTransaction, KeyError> {
        let signature = key_pair.sign(&self)?;
        Ok(SignedTransaction::from_parts(self, signature))
    }

    /// Coinbase transfers carry no signature
    pub fn into_unsigned(self) -> SignedTransaction {
        SignedTransaction::from_parts(self, String::new())
    }
}

/// A transfer together with the sender's Base64 signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub timestamp: i64,
    #[serde(default)]
    pub signature: String,
}

impl SignedTransaction {
    fn from_parts(tx: Transaction, signature: String) -> Self {
        Self {
            from: tx.from,
            to: tx.to,
            amount: tx.amount,
            timestamp: tx.timestamp,
            signature,
        }
    }

    /// The signed payload
    pub fn transaction(&self) -> Transaction {
        Transaction {
            from: self.from.clone(),
            to: self.to.clone(),
            amount: self.amount,
            timestamp: self.timestamp,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.from == COINBASE_ADDRESS
    }

    /// Check the signature against the sender address.
    /// Coinbase transfers are always accepted.
    pub fn verify_signature(&self) -> bool {
        if self.is_coinbase() {
            return true;
        }
        match public_key_from_hex(&self.from) {
            Ok(public_key) => verify(&self.transaction(), &self.signature, &public_key),
            Err(_) => false,
        }
    }
}
