//! Gossip node
//!
//! `NodeState` owns the ledger, the peer directory and the local key pair.
//! Inbound messages are dispatched by [`NodeState::handle`], which mutates
//! state and returns the datagrams to send; broadcast targets are resolved
//! at dispatch time. [`Node`] runs the single event loop that owns the
//! state: datagrams, operator commands and finished mining jobs all arrive
//! as [`Event`]s on one channel, so there is exactly one writer.

use crate::cli::{self, Command};
use crate::core::{
    Block, Ledger, SignedTransaction, Transaction, ValidationError, DEFAULT_DIFFICULTY,
};
use crate::crypto::KeyPair;
use crate::mining::{Miner, MiningError, MiningStats};
use crate::network::message::Message;
use crate::network::peer::{PeerDirectory, PeerInfo};
use crate::network::transport::{Transport, TransportError};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Port of the well-known seed node
pub const DEFAULT_PORT: u16 = 8888;

/// Capacity of the event channel feeding the loop
const EVENT_QUEUE: usize = 1000;

/// Node errors
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// P2P node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Host to bind
    pub host: String,
    /// Port to listen on; 0 picks an ephemeral port
    pub port: u16,
    /// Seed node contacted on startup when `port` differs from the seed's
    pub seed: PeerInfo,
    /// Leading zero hex digits required of block hashes
    pub difficulty: usize,
    /// Key pair file
    pub wallet_path: PathBuf,
}

impl NodeConfig {
    /// A node joins the mesh through the seed unless it is the seed
    pub fn should_bootstrap(&self) -> bool {
        self.port != self.seed.port
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            seed: PeerInfo::new("127.0.0.1", DEFAULT_PORT),
            difficulty: DEFAULT_DIFFICULTY,
            wallet_path: PathBuf::from("wallet.json"),
        }
    }
}

/// A datagram to send
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: PeerInfo,
    pub message: Message,
}

impl Outbound {
    pub fn new(to: PeerInfo, message: Message) -> Self {
        Self { to, message }
    }
}

/// Everything the node mutates
pub struct NodeState {
    pub ledger: Ledger,
    pub peers: PeerDirectory,
    keys: Arc<KeyPair>,
}

impl NodeState {
    pub fn new(ledger: Ledger, keys: Arc<KeyPair>) -> Self {
        Self {
            ledger,
            peers: PeerDirectory::new(),
            keys,
        }
    }

    /// The local address (hex public key)
    pub fn address(&self) -> String {
        self.keys.public_key_hex()
    }

    /// One datagram per known peer, in directory order
    pub fn broadcast(&self, message: Message) -> Vec<Outbound> {
        self.peers
            .iter()
            .map(|peer| Outbound::new(peer.clone(), message.clone()))
            .collect()
    }

    /// Dispatch one inbound message from `from`
    pub fn handle(&mut self, from: PeerInfo, message: Message) -> Vec<Outbound> {
        log::debug!("Received {} from {}", message.type_name(), from);

        match message {
            Message::NewPeer => {
                log::info!("New peer joined: {}", from);
                let mut out = self.broadcast(Message::SayHi(from.clone()));
                out.push(Outbound::new(
                    from.clone(),
                    Message::PeerList {
                        peers: self.peers.to_vec(),
                    },
                ));
                out.push(Outbound::new(
                    from.clone(),
                    Message::ChainSync {
                        blockchain: self.ledger.chain().to_vec(),
                        trans: self.ledger.pending().to_vec(),
                    },
                ));
                self.peers.insert(from);
                out
            }

            Message::SayHi(peer) => {
                log::info!("Saying hi to new peer {}", peer);
                self.peers.insert(peer.clone());
                vec![Outbound::new(peer, Message::Hi)]
            }

            Message::Hi => Vec::new(),

            Message::PeerList { peers } => {
                let added = self.peers.merge(peers);
                log::debug!("Merged peer list from {}: {} new", from, added);
                self.broadcast(Message::Hi)
            }

            Message::ChainSync { blockchain, trans } => {
                if let Err(e) = self.ledger.replace_pending(trans) {
                    log::warn!("Rejected pending pool from {}: {}", from, e);
                }
                if blockchain.len() > 1 {
                    match self.ledger.replace_chain(blockchain) {
                        Ok(()) => log::info!("Adopted chain from {}", from),
                        Err(e) => log::warn!("Rejected chain from {}: {}", from, e),
                    }
                }
                Vec::new()
            }

            Message::Trans(tx) => match self.ledger.add_transaction(tx.clone()) {
                Ok(()) => {
                    log::info!(
                        "Accepted transaction {} -> {} ({})",
                        tx.from,
                        tx.to,
                        tx.amount
                    );
                    self.broadcast(Message::Trans(tx))
                }
                Err(ValidationError::DuplicateTransaction) => Vec::new(),
                Err(e) => {
                    log::warn!("Rejected transaction from {}: {}", from, e);
                    Vec::new()
                }
            },

            Message::Mine(block) => {
                if block.hash == self.ledger.tip().hash {
                    return Vec::new();
                }
                let index = block.index;
                match self.ledger.submit_block(block.clone()) {
                    Ok(()) => {
                        log::info!("Accepted block {} mined by a peer", index);
                        self.broadcast(Message::Mine(block))
                    }
                    Err(e) => {
                        log::warn!("Rejected block {} from {}: {}", index, from, e);
                        Vec::new()
                    }
                }
            }

            Message::Chat(text) => {
                println!("==> {}", text);
                Vec::new()
            }
        }
    }

    /// Local transfer. Coinbase transfers go straight into the pool and are
    /// not gossiped; anything else must be covered by the sender's balance,
    /// is signed with the local key and broadcast.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<(SignedTransaction, Vec<Outbound>), ValidationError> {
        let tx = Transaction::new(from, to, amount);
        if tx.is_coinbase() {
            let tx = tx.into_unsigned();
            self.ledger.push_pending(tx.clone());
            return Ok((tx, Vec::new()));
        }

        let have = self.ledger.balance(from);
        if have < i128::from(amount) {
            return Err(ValidationError::InsufficientBalance { have, need: amount });
        }

        let tx = tx
            .sign(&self.keys)
            .map_err(|_| ValidationError::BadSignature)?;
        self.ledger.add_transaction(tx.clone())?;
        let out = self.broadcast(Message::Trans(tx.clone()));
        Ok((tx, out))
    }

    /// Append a block produced by a detached mining job, if it still
    /// extends the current tip
    pub fn accept_mined(&mut self, block: Block) -> Result<Vec<Outbound>, MiningError> {
        self.ledger.submit_block(block.clone())?;
        Ok(self.broadcast(Message::Mine(block)))
    }
}

/// Inputs to the node's event loop
#[derive(Debug)]
pub enum Event {
    /// A decoded datagram
    Inbound(SocketAddr, Message),
    /// An operator command
    Command(Command),
    /// A mining job finished (`None` if it was cancelled)
    Mined(Option<(Block, MiningStats)>),
    /// Report status on the given channel
    Status(oneshot::Sender<NodeStatus>),
    Shutdown,
}

/// Node status information
#[derive(Debug, Clone)]
pub struct NodeStatus {
    pub port: u16,
    pub height: u64,
    pub tip_hash: String,
    pub peers: Vec<PeerInfo>,
    pub pending_tx: usize,
    pub mining: bool,
}

/// Cheap handle for talking to a running node
#[derive(Clone)]
pub struct NodeHandle {
    events: mpsc::Sender<Event>,
}

impl NodeHandle {
    pub async fn command(&self, command: Command) -> bool {
        self.events.send(Event::Command(command)).await.is_ok()
    }

    pub async fn status(&self) -> Option<NodeStatus> {
        let (tx, rx) = oneshot::channel();
        self.events.send(Event::Status(tx)).await.ok()?;
        rx.await.ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.events.send(Event::Shutdown).await;
    }
}

/// The running P2P node
pub struct Node {
    pub config: NodeConfig,
    state: NodeState,
    transport: Transport,
    local_addr: SocketAddr,
    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
    mining: Option<CancellationToken>,
}

impl Node {
    /// Bind the socket and build a node holding only the genesis block
    pub async fn bind(config: NodeConfig, keys: Arc<KeyPair>) -> Result<Self, NodeError> {
        let transport = Transport::bind(&config.host, config.port).await?;
        let local_addr = transport.local_addr()?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        let state = NodeState::new(Ledger::with_difficulty(config.difficulty), keys);

        Ok(Self {
            config,
            state,
            transport,
            local_addr,
            events_tx,
            events_rx,
            mining: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn handle(&self) -> NodeHandle {
        NodeHandle {
            events: self.events_tx.clone(),
        }
    }

    /// Announce ourselves to the seed and remember it as a peer
    pub async fn bootstrap(&mut self) {
        if !self.config.should_bootstrap() {
            return;
        }
        let seed = self.config.seed.clone();
        log::info!("Joining the network through seed {}", seed);
        self.send_all(vec![Outbound::new(seed.clone(), Message::NewPeer)])
            .await;
        self.state.peers.insert(seed);
    }

    /// Run the event loop until shutdown
    pub async fn run(mut self) -> Result<(), NodeError> {
        let receiver = self
            .transport
            .spawn_receiver(self.events_tx.clone(), Event::Inbound);

        self.bootstrap().await;

        while let Some(event) = self.events_rx.recv().await {
            if !self.handle_event(event).await {
                break;
            }
        }

        if let Some(token) = self.mining.take() {
            token.cancel();
        }
        receiver.abort();
        log::info!("Node shutting down...");
        Ok(())
    }

    /// Process one event; returns `false` to stop the loop
    async fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Inbound(from, message) => {
                let tip_before = self.state.ledger.tip().hash.clone();
                let out = self.state.handle(PeerInfo::from(from), message);
                if self.state.ledger.tip().hash != tip_before {
                    self.cancel_mining();
                }
                self.send_all(out).await;
            }
            Event::Command(command) => self.execute(command).await,
            Event::Mined(result) => self.finish_mining(result).await,
            Event::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Event::Shutdown => return false,
        }
        true
    }

    /// Run an operator command
    pub async fn execute(&mut self, command: Command) {
        match command {
            Command::Send(text) => {
                let out = self.state.broadcast(Message::Chat(text));
                self.send_all(out).await;
            }
            Command::Peers => cli::show_peers(&self.state.peers),
            Command::Blockchain => cli::show_chain(&self.state.ledger),
            Command::Pending => cli::show_pending(&self.state.ledger),
            Command::Mine => self.start_mining(),
            Command::Trans { from, to, amount } => {
                match self.state.transfer(&from, &to, amount) {
                    Ok((_, out)) => self.send_all(out).await,
                    Err(e) => println!("Transfer failed: {}", e),
                }
            }
            Command::VerifyChain => {
                if let Err(e) = cli::verify_chain(&self.state.ledger) {
                    log::warn!("Local chain failed verification: {}", e);
                }
            }
            Command::Balance(address) => {
                let address = address.unwrap_or_else(|| self.state.address());
                cli::show_balance(&self.state.ledger, &address);
            }
            Command::Unknown(input) => println!("Unknown command: {}", input),
        }
    }

    /// Start a proof-of-work search on a blocking thread
    fn start_mining(&mut self) {
        if self.mining.is_some() {
            println!("Already mining");
            return;
        }

        let miner = Miner::new(&self.state.address());
        let job = match miner.prepare(&self.state.ledger) {
            Ok(job) => job,
            Err(e) => {
                println!("Cannot mine: {}", e);
                return;
            }
        };

        let token = CancellationToken::new();
        let cancel = token.clone();
        let events = self.events_tx.clone();
        self.mining = Some(token);

        tokio::task::spawn_blocking(move || {
            let result = job.run(Some(&cancel));
            let _ = events.blocking_send(Event::Mined(result));
        });
    }

    fn cancel_mining(&mut self) {
        if let Some(token) = &self.mining {
            log::info!("Tip moved; cancelling local mining");
            token.cancel();
        }
    }

    async fn finish_mining(&mut self, result: Option<(Block, MiningStats)>) {
        self.mining = None;
        let Some((block, stats)) = result else {
            return;
        };

        let index = block.index;
        match self.state.accept_mined(block) {
            Ok(out) => {
                println!(
                    "Mined block {} after {} attempts in {}ms, reward credited",
                    index, stats.hash_attempts, stats.time_ms
                );
                log::info!("Hash rate: {:.0} H/s", stats.hash_rate);
                self.send_all(out).await;
            }
            Err(e) => println!("Mined block {} rejected: {}", index, e),
        }
    }

    fn status(&self) -> NodeStatus {
        let tip = self.state.ledger.tip();
        NodeStatus {
            port: self.local_addr.port(),
            height: tip.index,
            tip_hash: tip.hash.clone(),
            peers: self.state.peers.to_vec(),
            pending_tx: self.state.ledger.pending().len(),
            mining: self.mining.is_some(),
        }
    }

    /// Send every datagram; failures are logged and dropped
    async fn send_all(&self, out: Vec<Outbound>) {
        for Outbound { to, message } in out {
            if let Err(e) = self.transport.send(&message, &to).await {
                log::warn!("Failed to send {} to {}: {}", message.type_name(), to, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::mine_on;
    use std::time::Duration;

    const TEST_DIFFICULTY: usize = 2;

    fn state() -> NodeState {
        NodeState::new(
            Ledger::with_difficulty(TEST_DIFFICULTY),
            Arc::new(KeyPair::generate()),
        )
    }

    fn peer(port: u16) -> PeerInfo {
        PeerInfo::new("127.0.0.1", port)
    }

    #[test]
    fn test_new_peer_handshake() {
        let mut node = state();
        node.peers.insert(peer(1));
        node.peers.insert(peer(2));

        let out = node.handle(peer(3), Message::NewPeer);

        assert_eq!(out.len(), 4);
        assert_eq!(out[0], Outbound::new(peer(1), Message::SayHi(peer(3))));
        assert_eq!(out[1], Outbound::new(peer(2), Message::SayHi(peer(3))));
        assert_eq!(
            out[2],
            Outbound::new(
                peer(3),
                Message::PeerList {
                    peers: vec![peer(1), peer(2)]
                }
            )
        );
        assert!(matches!(
            &out[3],
            Outbound { to, message: Message::ChainSync { blockchain, trans } }
                if *to == peer(3) && blockchain.len() == 1 && trans.is_empty()
        ));
        assert!(node.peers.contains(&peer(3)));
    }

    #[test]
    fn test_say_hi_and_hi() {
        let mut node = state();
        let out = node.handle(peer(1), Message::SayHi(peer(9)));
        assert_eq!(out, vec![Outbound::new(peer(9), Message::Hi)]);
        assert!(node.peers.contains(&peer(9)));

        assert!(node.handle(peer(9), Message::Hi).is_empty());
        assert!(node.handle(peer(9), Message::Chat("yo".into())).is_empty());
        assert_eq!(node.peers.len(), 1);
    }

    #[test]
    fn test_peer_list_merges_and_greets() {
        let mut node = state();
        node.peers.insert(peer(1));
        let out = node.handle(
            peer(1),
            Message::PeerList {
                peers: vec![peer(1), peer(2), peer(2)],
            },
        );
        assert_eq!(node.peers.len(), 2);
        assert_eq!(
            out,
            vec![
                Outbound::new(peer(1), Message::Hi),
                Outbound::new(peer(2), Message::Hi)
            ]
        );
    }

    #[test]
    fn test_duplicate_trans_is_pooled_once() {
        let mut node = state();
        node.peers.insert(peer(1));
        let kp = KeyPair::generate();
        let tx = Transaction::new(&kp.public_key_hex(), "bob", 3)
            .sign(&kp)
            .unwrap();

        let first = node.handle(peer(1), Message::Trans(tx.clone()));
        let second = node.handle(peer(2), Message::Trans(tx.clone()));

        assert_eq!(first, vec![Outbound::new(peer(1), Message::Trans(tx))]);
        assert!(second.is_empty());
        assert_eq!(node.ledger.pending().len(), 1);
    }

    #[test]
    fn test_forged_trans_not_relayed() {
        let mut node = state();
        node.peers.insert(peer(1));
        let kp = KeyPair::generate();
        let mut tx = Transaction::new(&kp.public_key_hex(), "bob", 3)
            .sign(&kp)
            .unwrap();
        tx.amount = 300;

        assert!(node.handle(peer(1), Message::Trans(tx)).is_empty());
        assert!(node.ledger.pending().is_empty());
    }

    #[test]
    fn test_mine_message() {
        let mut node = state();
        node.peers.insert(peer(1));
        node.handle(
            peer(1),
            Message::Trans(Transaction::coinbase("x", 1).into_unsigned()),
        );

        let block = mine_on(node.ledger.tip(), vec![], TEST_DIFFICULTY);
        let out = node.handle(peer(1), Message::Mine(block.clone()));
        assert_eq!(out, vec![Outbound::new(peer(1), Message::Mine(block.clone()))]);
        assert_eq!(node.ledger.len(), 2);
        assert!(node.ledger.pending().is_empty());

        // Echo of our own tip is ignored
        assert!(node.handle(peer(1), Message::Mine(block)).is_empty());
        assert_eq!(node.ledger.len(), 2);
    }

    #[test]
    fn test_competing_block_at_same_height_rejected() {
        let mut node = state();
        let genesis = node.ledger.tip().clone();
        let reward = |to: &str| vec![Transaction::coinbase(to, 100).into_unsigned()];
        let a = mine_on(&genesis, reward("A"), TEST_DIFFICULTY);
        let b = mine_on(&genesis, reward("B"), TEST_DIFFICULTY);
        assert_ne!(a.hash, b.hash);

        node.handle(peer(1), Message::Mine(a.clone()));
        let out = node.handle(peer(2), Message::Mine(b));
        assert!(out.is_empty());
        assert_eq!(node.ledger.tip(), &a);
    }

    #[test]
    fn test_chain_sync() {
        let mut remote = state();
        let miner = Miner::new("R");
        miner.mine(&mut remote.ledger).unwrap();
        miner.mine(&mut remote.ledger).unwrap();
        let tx = Transaction::coinbase("p", 1).into_unsigned();
        remote.ledger.add_transaction(tx.clone()).unwrap();

        let mut node = state();
        let out = node.handle(
            peer(1),
            Message::ChainSync {
                blockchain: remote.ledger.chain().to_vec(),
                trans: remote.ledger.pending().to_vec(),
            },
        );
        assert!(out.is_empty());
        assert_eq!(node.ledger.chain(), remote.ledger.chain());
        assert_eq!(node.ledger.pending(), &[tx]);

        // Genesis-only sync leaves the chain alone but still syncs pending
        node.handle(
            peer(1),
            Message::ChainSync {
                blockchain: vec![Block::genesis()],
                trans: vec![],
            },
        );
        assert_eq!(node.ledger.len(), 3);
        assert!(node.ledger.pending().is_empty());
    }

    #[test]
    fn test_huge_coinbase_from_peer_keeps_balances_sane() {
        let mut node = state();
        let me = node.address();
        let huge = vec![
            Transaction::coinbase(&me, i64::MAX as u64).into_unsigned(),
            Transaction::coinbase(&me, i64::MAX as u64).into_unsigned(),
        ];
        let block = mine_on(node.ledger.tip(), huge, TEST_DIFFICULTY);
        node.handle(peer(1), Message::Mine(block));
        assert_eq!(node.ledger.len(), 2);

        let have = 2 * i128::from(i64::MAX);
        assert_eq!(node.ledger.balance(&me), have);
        assert_eq!(
            node.transfer(&me, "bob", u64::MAX).unwrap_err(),
            ValidationError::InsufficientBalance {
                have,
                need: u64::MAX
            }
        );
        assert!(node.transfer(&me, "bob", i64::MAX as u64).is_ok());
    }

    #[test]
    fn test_local_transfer() {
        let mut node = state();
        node.peers.insert(peer(1));
        let me = node.address();

        assert!(matches!(
            node.transfer(&me, "bob", 10),
            Err(ValidationError::InsufficientBalance { have: 0, need: 10 })
        ));
        assert!(matches!(
            node.transfer(&me, "bob", u64::MAX),
            Err(ValidationError::InsufficientBalance { have: 0, need: u64::MAX })
        ));
        assert!(node.ledger.pending().is_empty());

        // Coinbase transfers are pooled silently
        let (_, out) = node.transfer("0", &me, 50).unwrap();
        assert!(out.is_empty());
        let pending = node.ledger.pending().to_vec();
        let block = mine_on(node.ledger.tip(), pending, TEST_DIFFICULTY);
        node.ledger.submit_block(block).unwrap();
        assert_eq!(node.ledger.balance(&me), 50);

        let (tx, out) = node.transfer(&me, "bob", 10).unwrap();
        assert!(tx.verify_signature());
        assert_eq!(out, vec![Outbound::new(peer(1), Message::Trans(tx))]);

        // Funds that are not ours cannot be signed for
        node.transfer("0", "someone", 50).unwrap();
        let pending = node.ledger.pending().to_vec();
        let block = mine_on(node.ledger.tip(), pending, TEST_DIFFICULTY);
        node.ledger.submit_block(block).unwrap();
        assert_eq!(
            node.transfer("someone", "bob", 5).unwrap_err(),
            ValidationError::BadSignature
        );
    }

    #[test]
    fn test_accept_mined_after_tip_moved() {
        let mut node = state();
        let job = Miner::new("me").prepare(&node.ledger).unwrap();
        let competitor = mine_on(node.ledger.tip(), vec![], TEST_DIFFICULTY);
        node.handle(peer(1), Message::Mine(competitor));

        let (block, _) = job.run(None).unwrap();
        assert!(matches!(
            node.accept_mined(block),
            Err(MiningError::InvalidBlock(_))
        ));
        assert_eq!(node.ledger.len(), 2);
    }

    async fn wait_for<F>(handle: &NodeHandle, what: &str, check: F) -> NodeStatus
    where
        F: Fn(&NodeStatus) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
        loop {
            let status = handle.status().await.expect("node stopped");
            if check(&status) {
                return status;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {}",
                what
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn test_verify_chain_command_reports_without_mutation() {
        let config = NodeConfig {
            host: "127.0.0.1".into(),
            port: 0,
            seed: peer(0),
            difficulty: TEST_DIFFICULTY,
            ..NodeConfig::default()
        };
        let mut node = Node::bind(config, Arc::new(KeyPair::generate()))
            .await
            .unwrap();
        let block = mine_on(node.state.ledger.tip(), vec![], TEST_DIFFICULTY);
        node.state.ledger.submit_block(block).unwrap();

        node.execute(Command::VerifyChain).await;
        assert_eq!(node.state().ledger.len(), 2);
        assert!(cli::verify_chain(&node.state().ledger).is_ok());
    }

    #[tokio::test]
    async fn test_two_nodes_join_and_gossip_block() {
        // The seed's own port matches the seed entry, so it does not bootstrap
        let seed_config = NodeConfig {
            host: "127.0.0.1".into(),
            port: 0,
            seed: peer(0),
            difficulty: TEST_DIFFICULTY,
            ..NodeConfig::default()
        };
        let seed = Node::bind(seed_config, Arc::new(KeyPair::generate()))
            .await
            .unwrap();
        let seed_addr = seed.local_addr();
        let seed_handle = seed.handle();
        tokio::spawn(seed.run());

        let joiner_config = NodeConfig {
            host: "127.0.0.1".into(),
            port: 0,
            seed: PeerInfo::from(seed_addr),
            difficulty: TEST_DIFFICULTY,
            ..NodeConfig::default()
        };
        let joiner = Node::bind(joiner_config, Arc::new(KeyPair::generate()))
            .await
            .unwrap();
        let joiner_addr = joiner.local_addr();
        let joiner_handle = joiner.handle();
        tokio::spawn(joiner.run());

        wait_for(&seed_handle, "seed to learn joiner", |s| {
            s.peers.contains(&PeerInfo::from(joiner_addr))
        })
        .await;
        wait_for(&joiner_handle, "joiner to know seed", |s| {
            s.peers.contains(&PeerInfo::from(seed_addr))
        })
        .await;

        assert!(joiner_handle.command(Command::Mine).await);
        let mined = wait_for(&joiner_handle, "joiner to mine", |s| s.height == 1).await;
        let seen = wait_for(&seed_handle, "seed to accept block", |s| s.height == 1).await;
        assert_eq!(mined.tip_hash, seen.tip_hash);

        seed_handle.shutdown().await;
        joiner_handle.shutdown().await;
    }
}
