//! UDP transport
//!
//! One message per datagram, no framing, no acknowledgements. Send
//! failures are returned to the caller, which logs and drops them.

use crate::network::message::{DecodeError, Message, MAX_DATAGRAM_SIZE};
use crate::network::peer::PeerInfo;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Message too large for one datagram: {0} bytes")]
    TooLarge(usize),
}

/// A bound UDP socket shared by the receive task and the sender
#[derive(Clone)]
pub struct Transport {
    socket: Arc<UdpSocket>,
}

impl Transport {
    /// Bind to `host:port`; port 0 picks an ephemeral port
    pub async fn bind(host: &str, port: u16) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind((host, port)).await?;
        log::info!("Node listening on {}", socket.local_addr()?);
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// Get the bound address
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Send one message to one peer
    pub async fn send(&self, message: &Message, peer: &PeerInfo) -> Result<(), TransportError> {
        let bytes = message.to_bytes()?;
        if bytes.len() > MAX_DATAGRAM_SIZE {
            return Err(TransportError::TooLarge(bytes.len()));
        }
        self.socket
            .send_to(&bytes, (peer.address.as_str(), peer.port))
            .await?;
        Ok(())
    }

    /// Spawn the receive loop. Decoded messages are handed to `sink` as
    /// they arrive; undecodable datagrams are logged and dropped. The
    /// task ends when `sink` is closed.
    pub fn spawn_receiver<T, F>(&self, sink: mpsc::Sender<T>, wrap: F) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: Fn(SocketAddr, Message) -> T + Send + 'static,
    {
        let socket = self.socket.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
            loop {
                let (len, from) = match socket.recv_from(&mut buf).await {
                    Ok(received) => received,
                    Err(e) => {
                        log::warn!("Receive error: {}", e);
                        continue;
                    }
                };

                match Message::from_bytes(&buf[..len]) {
                    Ok(msg) => {
                        if sink.send(wrap(from, msg)).await.is_err() {
                            break;
                        }
                    }
                    Err(DecodeError::UnknownType(tag)) => {
                        log::warn!("Ignoring unknown message type '{}' from {}", tag, from);
                    }
                    Err(e) => {
                        log::warn!("Dropping datagram from {}: {}", from, e);
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive() {
        let a = Transport::bind("127.0.0.1", 0).await.unwrap();
        let b = Transport::bind("127.0.0.1", 0).await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let handle = b.spawn_receiver(tx, |from, msg| (from, msg));

        let b_peer = PeerInfo::from(b.local_addr().unwrap());
        a.send(&Message::Chat("hi there".into()), &b_peer)
            .await
            .unwrap();

        let (from, msg) = rx.recv().await.unwrap();
        assert_eq!(from, a.local_addr().unwrap());
        assert_eq!(msg, Message::Chat("hi there".into()));
        handle.abort();
    }

    #[tokio::test]
    async fn test_garbage_is_dropped() {
        let b = Transport::bind("127.0.0.1", 0).await.unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = b.spawn_receiver(tx, |from, msg| (from, msg));

        let raw = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = b.local_addr().unwrap();
        raw.send_to(b"garbage", target).await.unwrap();
        raw.send_to(br#"{"type":"bogus"}"#, target).await.unwrap();
        raw.send_to(br#"{"type":"hi"}"#, target).await.unwrap();

        let (_, msg) = rx.recv().await.unwrap();
        assert_eq!(msg, Message::Hi);
        handle.abort();
    }

    #[tokio::test]
    async fn test_oversized_message_rejected() {
        let a = Transport::bind("127.0.0.1", 0).await.unwrap();
        let peer = PeerInfo::new("127.0.0.1", 9);
        let huge = Message::Chat("x".repeat(MAX_DATAGRAM_SIZE));
        assert!(matches!(
            a.send(&huge, &peer).await,
            Err(TransportError::TooLarge(_))
        ));
    }
}
