//! Constants used across the relay project

/// Default path of the Tendermint configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "$HOME/.tendermint/config/config.toml";

/// Default address of the downstream ABCI application socket.
pub const DEFAULT_APP_ADDRESS: &str = "tcp://0.0.0.0:26658";

/// Default address the relay serves ABCI on for the node runtime.
pub const DEFAULT_LISTEN_ADDRESS: &str = "tcp://127.0.0.1:26659";

/// Default transport to the downstream application.
pub const DEFAULT_TRANSPORT: &str = "socket";

/// Default rollup block time, in seconds.
pub const DEFAULT_BLOCK_TIME_SECS: u64 = 15;

/// Default namespace id, hex encoded.
pub const DEFAULT_NAMESPACE_ID: &str = "0000000000000000";

/// Default data availability layer.
pub const DEFAULT_DA_LAYER: &str = "celestia";

/// Default data availability layer configuration.
pub const DEFAULT_DA_CONFIG: &str = r#"{"host":"127.0.0.1:18332","user":"rpcuser","pass":"rpcpass","http_post_mode":true,"disable_tls":true}"#;

/// Default read buffer size for ABCI socket connections (1 MiB).
pub const DEFAULT_READ_BUF_SIZE: usize = 1_048_576;

/// Length of the namespace id, in bytes.
pub const NAMESPACE_ID_LEN: usize = 8;

/// Bytes of the transaction template kept verbatim before the token.
///
/// Tied to the layout of the externally generated template.
pub const TEMPLATE_PREFIX_LEN: usize = 8;

/// Offset in the transaction template where the kept suffix starts.
///
/// Tied to the layout of the externally generated template.
pub const TEMPLATE_SUFFIX_OFFSET: usize = 44;

/// Default Tendermint RPC endpoint targeted by the load generator.
pub const DEFAULT_RPC_ENDPOINT: &str = "http://127.0.0.1:26657";
