//! Command line arguments of the relay host.

use clap::{ArgAction, Parser};
use relay_common::constants::{
    DEFAULT_APP_ADDRESS, DEFAULT_BLOCK_TIME_SECS, DEFAULT_CONFIG_FILE, DEFAULT_DA_CONFIG,
    DEFAULT_DA_LAYER, DEFAULT_LISTEN_ADDRESS, DEFAULT_NAMESPACE_ID, DEFAULT_READ_BUF_SIZE,
    DEFAULT_TRANSPORT,
};

/// Command line arguments of the relay host process.
///
/// Flag names follow the Tendermint and Rollkit conventions, so existing
/// launch scripts keep working.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "abci-relay", about = "Runs a rollup node against an external ABCI application")]
pub struct RelayArgs {
    /// Path to the Tendermint `config.toml`
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Address of the downstream application socket
    #[arg(long, env = "ABCI_RELAY_APP_ADDRESS", default_value = DEFAULT_APP_ADDRESS)]
    pub address: String,

    /// Either `socket` or `grpc`
    #[arg(long, default_value = DEFAULT_TRANSPORT)]
    pub transport: String,

    /// Enable fraud proofs
    #[arg(
        long = "fraud_proofs",
        default_value_t = false,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub fraud_proofs: bool,

    /// Block time of the rollup, in seconds
    #[arg(long = "block_time", default_value_t = DEFAULT_BLOCK_TIME_SECS)]
    pub block_time: u64,

    /// Namespace id, hex encoded
    #[arg(long = "rollkit.namespace_id", default_value = DEFAULT_NAMESPACE_ID)]
    pub namespace_id: String,

    /// DA height to start at when querying blocks
    #[arg(long = "rollkit.da_start_height", default_value_t = 0)]
    pub da_start_height: u64,

    /// Run the node in aggregator mode
    #[arg(
        long = "rollkit.aggregator",
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub aggregator: bool,

    /// Data availability layer to use
    #[arg(long = "rollkit.da_layer", default_value = DEFAULT_DA_LAYER)]
    pub da_layer: String,

    /// Configuration of the data availability layer, as JSON
    #[arg(long = "rollkit.da_config", default_value = DEFAULT_DA_CONFIG)]
    pub da_config: String,

    /// Address the relay serves ABCI on for the node runtime
    #[arg(long, env = "ABCI_RELAY_LISTEN_ADDRESS", default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen: String,

    /// Read buffer size of ABCI socket connections, in bytes
    #[arg(long = "read-buf-size", default_value_t = DEFAULT_READ_BUF_SIZE)]
    pub read_buf_size: usize,
}
