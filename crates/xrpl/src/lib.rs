//! Minimal XRP Ledger client: enough to inspect accounts and to sign and
//! submit XRP payments.

pub mod address;
pub mod amount;
pub mod client;
pub mod codec;
pub mod keys;
pub mod wallet;

pub use {
    address::ClassicAddress,
    client::{Client, Ledger},
    keys::{Keypair, Seed},
    wallet::Wallet,
};

/// Public websocket endpoint used unless configured otherwise.
pub const DEFAULT_URL: &str = "wss://xrplcluster.com";
