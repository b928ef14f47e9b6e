//! Rollup node host for the ABCI relay
//!
//! This crate provides the node side of the relay, including:
//! - Command line arguments and the immutable node configuration
//! - Tendermint config, key and genesis loading
//! - The ABCI server lifecycle
//! - Logging setup

pub mod args;
pub mod config;
pub mod genesis;
pub mod keys;
pub mod logging;
pub mod node;
pub mod tendermint;

// Re-export public types
pub use args::RelayArgs;
pub use config::{BlockManagerConfig, ConfigError, NamespaceId, NodeConfig, RollkitConfig, Transport};
pub use genesis::GenesisDoc;
pub use keys::{Ed25519Secret, NodeKey, PrivValidator};
pub use logging::init_tracing;
pub use node::{NodeError, NodeHandle, RollupNode};
pub use tendermint::TendermintConfig;
