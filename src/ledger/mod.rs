// Ledger facade: content, relationship and data object records on chain
pub mod client;
pub mod models;
pub mod rpc;

pub use client::LedgerClient;
pub use rpc::{RpcLedgerClient, RpcLedgerConfig};
