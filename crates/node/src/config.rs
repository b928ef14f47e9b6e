//! Immutable node configuration assembled from arguments and `config.toml`.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use relay_common::{
    addr::{seeds_to_multiaddrs, socket_address, to_multiaddr, AddressError},
    constants::NAMESPACE_ID_LEN,
};
use crate::{args::RelayArgs, tendermint::TendermintConfig};

/// Transport to the downstream ABCI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Length-delimited protobuf over a TCP socket
    Socket,
    /// gRPC
    Grpc,
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "socket" => Ok(Self::Socket),
            "grpc" => Ok(Self::Grpc),
            other => Err(ConfigError::UnknownTransport(other.to_string())),
        }
    }
}

/// Namespace the rollup posts its blocks under on the DA layer.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NamespaceId(pub [u8; NAMESPACE_ID_LEN]);

impl NamespaceId {
    /// Decodes a hex namespace id.
    ///
    /// Shorter input fills the leading bytes and leaves the rest zero.
    pub fn from_hex(value: &str) -> Result<Self, ConfigError> {
        let bytes = hex::decode(value).map_err(|err| ConfigError::InvalidNamespaceId {
            value: value.to_string(),
            reason: err.to_string(),
        })?;
        if bytes.len() > NAMESPACE_ID_LEN {
            return Err(ConfigError::InvalidNamespaceId {
                value: value.to_string(),
                reason: format!("{} bytes, at most {NAMESPACE_ID_LEN} allowed", bytes.len()),
            });
        }
        let mut id = [0u8; NAMESPACE_ID_LEN];
        id[..bytes.len()].copy_from_slice(&bytes);
        Ok(Self(id))
    }
}

impl fmt::Debug for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamespaceId({self})")
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Block production settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockManagerConfig {
    /// Time between blocks.
    pub block_time: Duration,
    /// Whether fraud proofs are enabled.
    pub fraud_proofs: bool,
    /// DA height to start at when querying blocks.
    pub da_start_height: u64,
}

/// P2P addresses in multiaddr form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P2pAddresses {
    /// Listen address.
    pub listen_address: String,
    /// Seed nodes.
    pub seeds: Vec<String>,
}

/// Rollkit section of the node configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RollkitConfig {
    /// Whether the node runs as aggregator.
    pub aggregator: bool,
    /// Block production settings.
    pub block_manager: BlockManagerConfig,
    /// DA namespace.
    pub namespace_id: NamespaceId,
    /// Name of the DA layer.
    pub da_layer: String,
    /// DA layer configuration.
    pub da_config: serde_json::Value,
    /// P2P addresses translated from the Tendermint configuration.
    pub p2p: P2pAddresses,
}

/// Complete, immutable configuration of the relay host process.
///
/// Built once at startup with [`NodeConfig::from_args`] and passed around
/// explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Resolved path of `config.toml`.
    pub config_file: PathBuf,
    /// Root directory of the node, the grandparent of `config_file`.
    pub root_dir: PathBuf,
    /// Tendermint configuration read from `config_file`.
    pub tendermint: TendermintConfig,
    /// Downstream application address, `host:port`.
    pub app_address: String,
    /// Transport to the downstream application.
    pub transport: Transport,
    /// Address the relay serves ABCI on, `host:port`.
    pub listen_address: String,
    /// Read buffer size of ABCI socket connections.
    pub read_buf_size: usize,
    /// Rollkit settings.
    pub rollkit: RollkitConfig,
}

impl NodeConfig {
    /// Builds the configuration from command line arguments.
    pub fn from_args(args: &RelayArgs) -> Result<Self, ConfigError> {
        let home = std::env::var("HOME").ok();
        Self::from_args_with_home(args, home.as_deref())
    }

    /// Like [`NodeConfig::from_args`] with an explicit home directory.
    pub fn from_args_with_home(args: &RelayArgs, home: Option<&str>) -> Result<Self, ConfigError> {
        let transport: Transport = args.transport.parse()?;
        if transport == Transport::Grpc {
            return Err(ConfigError::UnsupportedTransport(args.transport.clone()));
        }
        if args.read_buf_size == 0 {
            return Err(ConfigError::Invalid("read buffer size must be positive"));
        }

        let config_file = expand_home(&args.config, home)?;
        let root_dir = config_file
            .parent()
            .and_then(Path::parent)
            .ok_or_else(|| ConfigError::InvalidConfigPath(config_file.clone()))?
            .to_path_buf();
        let tendermint = TendermintConfig::load(&config_file, &root_dir)?;

        let namespace_id = NamespaceId::from_hex(&args.namespace_id)?;
        let da_config =
            serde_json::from_str(&args.da_config).map_err(ConfigError::InvalidDaConfig)?;

        let p2p = P2pAddresses {
            listen_address: to_multiaddr(&tendermint.p2p.laddr)
                .map_err(|source| ConfigError::Address { field: "p2p.laddr", source })?,
            seeds: seeds_to_multiaddrs(&tendermint.p2p.seeds)
                .map_err(|source| ConfigError::Address { field: "p2p.seeds", source })?,
        };

        let app_address = socket_address(&args.address)
            .map_err(|source| ConfigError::Address { field: "address", source })?;
        let listen_address = socket_address(&args.listen)
            .map_err(|source| ConfigError::Address { field: "listen", source })?;

        Ok(Self {
            config_file,
            root_dir,
            tendermint,
            app_address,
            transport,
            listen_address,
            read_buf_size: args.read_buf_size,
            rollkit: RollkitConfig {
                aggregator: args.aggregator,
                block_manager: BlockManagerConfig {
                    block_time: Duration::from_secs(args.block_time),
                    fraud_proofs: args.fraud_proofs,
                    da_start_height: args.da_start_height,
                },
                namespace_id,
                da_layer: args.da_layer.clone(),
                da_config,
                p2p,
            },
        })
    }
}

/// Expands a leading `$HOME` or `~` in `path`.
fn expand_home(path: &str, home: Option<&str>) -> Result<PathBuf, ConfigError> {
    let rest = path
        .strip_prefix("$HOME")
        .or_else(|| path.strip_prefix("${HOME}"))
        .or_else(|| path.strip_prefix('~'));
    match rest {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home = home.ok_or(ConfigError::HomeNotSet)?;
            Ok(PathBuf::from(format!("{home}{rest}")))
        }
        _ => Ok(PathBuf::from(path)),
    }
}

/// Errors that can occur while building the node configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HOME is not set, cannot expand config path")]
    /// The config path refers to the home directory but `HOME` is unset.
    HomeNotSet,
    #[error("config path {0} has no root directory")]
    /// The config file path is too short to derive a root directory.
    InvalidConfigPath(PathBuf),
    #[error("failed to read config file {path}: {source}")]
    /// The Tendermint config file could not be read.
    ReadConfig {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    /// The Tendermint config file is not valid TOML.
    ParseConfig {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    #[error("config is invalid: {0}")]
    /// A configuration value failed validation.
    Invalid(&'static str),
    #[error("unknown transport `{0}`, expected socket or grpc")]
    /// The transport is neither socket nor grpc.
    UnknownTransport(String),
    #[error("transport `{0}` is not supported, use socket")]
    /// The transport is known but not implemented.
    UnsupportedTransport(String),
    #[error("invalid namespace id `{value}`: {reason}")]
    /// The namespace id is not valid hex or is too long.
    InvalidNamespaceId {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    #[error("DA config is not valid JSON: {0}")]
    /// The DA layer configuration is not JSON.
    InvalidDaConfig(serde_json::Error),
    #[error("invalid {field}: {source}")]
    /// An address could not be normalized.
    Address {
        /// The configuration field holding the address.
        field: &'static str,
        /// Underlying address error.
        source: AddressError,
    },
}
