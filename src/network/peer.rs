//! Peer directory
//!
//! Known peer endpoints, deduplicated by value. Insertion order is kept and
//! doubles as the broadcast order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// A peer endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerInfo {
    pub address: String,
    pub port: u16,
}

impl PeerInfo {
    pub fn new(address: &str, port: u16) -> Self {
        Self {
            address: address.to_string(),
            port,
        }
    }
}

impl From<SocketAddr> for PeerInfo {
    fn from(addr: SocketAddr) -> Self {
        Self {
            address: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

impl fmt::Display for PeerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Deduplicated, insertion-ordered set of peers
#[derive(Debug, Clone, Default)]
pub struct PeerDirectory {
    peers: Vec<PeerInfo>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer. Returns `false` if it was already known.
    pub fn insert(&mut self, peer: PeerInfo) -> bool {
        if self.peers.contains(&peer) {
            return false;
        }
        log::info!("Added peer: {}", peer);
        self.peers.push(peer);
        true
    }

    /// Merge a batch of peers, returning how many were new
    pub fn merge<I>(&mut self, peers: I) -> usize
    where
        I: IntoIterator<Item = PeerInfo>,
    {
        peers.into_iter().filter(|p| self.insert(p.clone())).count()
    }

    pub fn contains(&self, peer: &PeerInfo) -> bool {
        self.peers.contains(peer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerInfo> {
        self.peers.iter()
    }

    pub fn to_vec(&self) -> Vec<PeerInfo> {
        self.peers.clone()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
