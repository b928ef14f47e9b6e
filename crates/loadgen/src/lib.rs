//! Load generator for rollup ABCI applications
//!
//! Clients stamp a fresh UUID into a transaction template produced by an
//! external program, and the driver broadcasts the result to Tendermint RPC
//! endpoints with `broadcast_tx_async`.

pub mod broadcast;
pub mod client;
pub mod config;
pub mod driver;
pub mod template;

// Re-export public types
pub use broadcast::{BroadcastError, BroadcastReceipt, TxBroadcaster};
pub use client::{ClientError, ClientFactory, TemplateClient, TemplateClientFactory, TxClient};
pub use config::{ConfigError, LoadTestConfig};
pub use driver::{LoadTest, LoadTestError, LoadTestReport};
pub use template::{CommandTemplate, StaticTemplate, TemplateError, TemplateSource};
