//! Operator commands
//!
//! One command per line of standard input. Parsing is separate from
//! execution so the node can run commands on its own event loop.

use crate::core::{Ledger, ValidationError};
use crate::network::PeerDirectory;

/// A parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `send <text>`: broadcast a chat message
    Send(String),
    /// `peers`
    Peers,
    /// `blockchain`
    Blockchain,
    /// `pending`
    Pending,
    /// `mine`: mine with the local key as reward address
    Mine,
    /// `trans <from> <to> <amount>`
    Trans { from: String, to: String, amount: u64 },
    /// `verifyChain`
    VerifyChain,
    /// `balance [address]`: defaults to the local address
    Balance(Option<String>),
    /// Anything else, kept verbatim for the error report
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Command::Unknown(String::new());
        };

        match name {
            "send" => {
                let text = line[name.len()..].trim_start();
                Command::Send(text.to_string())
            }
            "peers" => Command::Peers,
            "blockchain" => Command::Blockchain,
            "pending" => Command::Pending,
            "mine" => Command::Mine,
            "verifyChain" => Command::VerifyChain,
            "balance" => Command::Balance(parts.next().map(str::to_string)),
            "trans" => {
                let args: Vec<&str> = parts.collect();
                match args.as_slice() {
                    [from, to, amount] => match amount.parse() {
                        Ok(amount) => Command::Trans {
                            from: from.to_string(),
                            to: to.to_string(),
                            amount,
                        },
                        Err(_) => Command::Unknown(line.to_string()),
                    },
                    _ => Command::Unknown(line.to_string()),
                }
            }
            _ => Command::Unknown(line.to_string()),
        }
    }
}

/// Print the peer directory
pub fn show_peers(peers: &PeerDirectory) {
    if peers.is_empty() {
        println!("No known peers");
        return;
    }
    println!("Known peers ({}):", peers.len());
    for peer in peers.iter() {
        println!("   {}", peer);
    }
}

/// Print the whole chain as JSON
pub fn show_chain(ledger: &Ledger) {
    match serde_json::to_string_pretty(ledger.chain()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to render chain: {}", e),
    }
}

/// Print the pending pool as JSON
pub fn show_pending(ledger: &Ledger) {
    match serde_json::to_string_pretty(ledger.pending()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to render pending pool: {}", e),
    }
}

pub fn show_balance(ledger: &Ledger, address: &str) {
    println!("Balance of {}: {}", address, ledger.balance(address));
}

/// Validate the local chain and report the outcome
pub fn verify_chain(ledger: &Ledger) -> Result<(), ValidationError> {
    let result = ledger.check_chain(ledger.chain());
    match &result {
        Ok(()) => println!("Chain is valid ({} blocks)", ledger.len()),
        Err(e) => println!("Chain is invalid: {}", e),
    }
    result
}
