//! ECDSA key management for the ledger
//!
//! Provides key pair generation, signing, and verification using
//! the secp256k1 elliptic curve. Payloads are serialized to JSON with a
//! fixed field order, hashed with SHA-256 and the digest is signed.
//! Signatures travel as Base64 of the 64-byte compact encoding.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use serde::Serialize;
use thiserror::Error;

use super::hash::sha256;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from raw 32-byte secret key material
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the public key as a hex string (compressed format).
    /// This is also the owner's ledger address.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Sign a payload with the private key
    pub fn sign<T: Serialize>(&self, payload: &T) -> Result<String, KeyError> {
        sign(payload, &self.secret_key)
    }

    /// Verify a signature against this key pair's public key
    pub fn verify<T: Serialize>(&self, payload: &T, signature: &str) -> bool {
        verify(payload, signature, &self.public_key)
    }

    /// Sign and verify a fixed message; a pair loaded from disk must pass this
    pub fn self_test(&self) -> bool {
        const PROBE: &str = "test message";
        match self.sign(&PROBE) {
            Ok(signature) => self.verify(&PROBE, &signature),
            Err(_) => false,
        }
    }
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

fn payload_digest<T: Serialize>(payload: &T) -> Result<Message, KeyError> {
    let bytes = serde_json::to_vec(payload)?;
    Ok(Message::from_digest_slice(&sha256(&bytes))?)
}

/// Sign the canonical serialization of `payload`, returning Base64
pub fn sign<T: Serialize>(payload: &T, secret_key: &SecretKey) -> Result<String, KeyError> {
    let secp = Secp256k1::signing_only();
    let message = payload_digest(payload)?;
    let signature = secp.sign_ecdsa(&message, secret_key);
    Ok(BASE64.encode(signature.serialize_compact()))
}

/// Verify a Base64 signature over `payload`. Malformed input yields `false`.
pub fn verify<T: Serialize>(payload: &T, signature: &str, public_key: &PublicKey) -> bool {
    let Ok(message) = payload_digest(payload) else {
        return false;
    };
    let Ok(raw) = BASE64.decode(signature) else {
        return false;
    };
    let Ok(sig) = Signature::from_compact(&raw) else {
        return false;
    };

    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&message, &sig, public_key).is_ok()
}
