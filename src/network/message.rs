//! Network message types for P2P communication
//!
//! Every datagram carries exactly one JSON object `{"type": ..., "data": ...}`.

use crate::core::{Block, SignedTransaction};
use crate::network::peer::PeerInfo;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest payload a single UDP datagram can carry
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Wire tags of every known message type
pub const MESSAGE_TYPES: [&str; 8] = [
    "newpeer",
    "sayhi",
    "hi",
    "peerlist",
    "blockchain",
    "trans",
    "mine",
    "chat",
];

/// Message decoding errors
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Message has no type tag")]
    MissingType,
    #[error("Unknown message type: {0}")]
    UnknownType(String),
}

/// Gossip protocol messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Message {
    /// A node joins through us
    NewPeer,

    /// Introduce a newly joined peer to existing peers
    SayHi(PeerInfo),

    /// Keep-alive / hole punching probe
    Hi,

    /// Known peers, sent to a joining node
    PeerList { peers: Vec<PeerInfo> },

    /// Full chain and pending pool, sent to a joining node
    #[serde(rename = "blockchain")]
    ChainSync {
        blockchain: Vec<Block>,
        trans: Vec<SignedTransaction>,
    },

    /// Gossip a pending transaction
    Trans(SignedTransaction),

    /// Announce a newly mined block
    Mine(Block),

    /// Free text for the operator
    Chat(String),
}

impl Message {
    /// Serialize message to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from bytes, telling unknown tags apart from
    /// malformed payloads
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_slice(data)?;
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(DecodeError::MissingType)?;

        if !MESSAGE_TYPES.contains(&tag) {
            return Err(DecodeError::UnknownType(tag.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Get message type name for logging
    pub fn type_name(&self) -> &'static str {
        match self {
            Message::NewPeer => "NewPeer",
            Message::SayHi(_) => "SayHi",
            Message::Hi => "Hi",
            Message::PeerList { .. } => "PeerList",
            Message::ChainSync { .. } => "ChainSync",
            Message::Trans(_) => "Trans",
            Message::Mine(_) => "Mine",
            Message::Chat(_) => "Chat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;

    #[test]
    fn test_wire_tags() {
        let json = serde_json::to_value(Message::NewPeer).unwrap();
        assert_eq!(json, serde_json::json!({"type": "newpeer"}));

        let json = serde_json::to_value(Message::SayHi(PeerInfo::new("1.2.3.4", 5))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "sayhi", "data": {"address": "1.2.3.4", "port": 5}})
        );

        let sync = Message::ChainSync {
            blockchain: vec![Block::genesis()],
            trans: vec![],
        };
        let json = serde_json::to_value(&sync).unwrap();
        assert_eq!(json["type"], "blockchain");
        assert!(json["data"]["blockchain"].is_array());
    }

    #[test]
    fn test_every_variant_decodes() {
        let tx = Transaction::coinbase("r", 100).into_unsigned();
        let messages = vec![
            Message::NewPeer,
            Message::SayHi(PeerInfo::new("127.0.0.1", 1)),
            Message::Hi,
            Message::PeerList {
                peers: vec![PeerInfo::new("127.0.0.1", 2)],
            },
            Message::ChainSync {
                blockchain: vec![Block::genesis()],
                trans: vec![tx.clone()],
            },
            Message::Trans(tx),
            Message::Mine(Block::genesis()),
            Message::Chat("hello".to_string()),
        ];
        assert_eq!(messages.len(), MESSAGE_TYPES.len());

        for msg in messages {
            let decoded = Message::from_bytes(&msg.to_bytes().unwrap()).unwrap();
            assert_eq!(decoded, msg);
        }
    }

    #[test]
    fn test_accepts_extra_peer_fields() {
        let raw = br#"{"type":"sayhi","data":{"address":"10.0.0.9","family":"IPv4","port":7,"size":12}}"#;
        assert_eq!(
            Message::from_bytes(raw).unwrap(),
            Message::SayHi(PeerInfo::new("10.0.0.9", 7))
        );
    }

    #[test]
    fn test_unknown_type_is_distinguished() {
        let err = Message::from_bytes(br#"{"type":"ping","data":1}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownType(t) if t == "ping"));

        let err = Message::from_bytes(br#"{"data":1}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingType));

        let err = Message::from_bytes(b"not json").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));

        let err = Message::from_bytes(br#"{"type":"mine","data":"nope"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }
}
