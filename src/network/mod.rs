//! P2P networking module
//!
//! Gossip over UDP: one JSON message per datagram, flooded to every known
//! peer.
//!
//! # Features
//! - Seed-based bootstrap into the mesh
//! - Peer list exchange and hole-punching greetings
//! - Transaction and block flooding
//! - Full chain sync for joining nodes (longest valid chain wins)

pub mod message;
pub mod node;
pub mod peer;
pub mod transport;

pub use message::{DecodeError, Message, MAX_DATAGRAM_SIZE, MESSAGE_TYPES};
pub use node::{
    Event, Node, NodeConfig, NodeError, NodeHandle, NodeState, NodeStatus, Outbound, DEFAULT_PORT,
};
pub use peer::{PeerDirectory, PeerInfo};
pub use transport::{Transport, TransportError};
