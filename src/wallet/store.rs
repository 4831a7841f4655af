//! Key pair persistence
//!
//! The node's key pair lives in a small JSON wallet file holding Base64
//! encodings of the compressed public key and the raw secret key. A file
//! that is missing, unreadable or fails the sign/verify self-test is
//! replaced by a freshly generated pair.

use crate::crypto::KeyPair;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Serializable wallet data for persistence
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletFile {
    public_key: String,
    private_key: String,
}

impl WalletFile {
    fn from_key_pair(key_pair: &KeyPair) -> Self {
        Self {
            public_key: BASE64.encode(key_pair.public_key.serialize()),
            private_key: BASE64.encode(key_pair.secret_key.secret_bytes()),
        }
    }

    /// Rebuild the pair, insisting that both halves belong together
    fn into_key_pair(self) -> Option<KeyPair> {
        let secret = BASE64.decode(self.private_key).ok()?;
        let public = BASE64.decode(self.public_key).ok()?;
        let key_pair = KeyPair::from_secret_bytes(&secret).ok()?;

        let consistent = key_pair.public_key.serialize().as_slice() == public.as_slice();
        (consistent && key_pair.self_test()).then_some(key_pair)
    }
}

/// Wallet file manager
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored pair, or generate and persist a new one
    pub fn load_or_create(&self) -> Result<KeyPair, StoreError> {
        match self.load() {
            Some(key_pair) => {
                log::info!("Loaded key pair from {:?}", self.path);
                Ok(key_pair)
            }
            None => {
                log::info!("Generating a new key pair at {:?}", self.path);
                let key_pair = KeyPair::generate();
                self.save(&key_pair)?;
                Ok(key_pair)
            }
        }
    }

    /// Read the wallet file; `None` if absent or not a usable pair
    pub fn load(&self) -> Option<KeyPair> {
        if !self.path.exists() {
            return None;
        }
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Cannot read {:?}: {}", self.path, e);
                return None;
            }
        };
        let file: WalletFile = match serde_json::from_str(&raw) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Wallet file {:?} is malformed: {}", self.path, e);
                return None;
            }
        };

        let key_pair = file.into_key_pair();
        if key_pair.is_none() {
            log::warn!("Wallet file {:?} holds an inconsistent key pair", self.path);
        }
        key_pair
    }

    /// Write the pair, replacing any previous file
    pub fn save(&self, key_pair: &KeyPair) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write to temporary file first
        let temp_path = self.path.with_extension("tmp");
        let mut writer = BufWriter::new(fs::File::create(&temp_path)?);
        serde_json::to_writer_pretty(&mut writer, &WalletFile::from_key_pair(key_pair))?;
        writer.flush()?;
        drop(writer);

        // Atomic rename
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}
