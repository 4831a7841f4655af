//! Line-oriented operator interface

pub mod commands;

pub use commands::{show_balance, show_chain, show_peers, show_pending, verify_chain, Command};
