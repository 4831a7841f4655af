//! Wallet file handling for the node's key pair

pub mod store;

pub use store::{KeyStore, StoreError};
