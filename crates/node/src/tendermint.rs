//! Tendermint `config.toml` subset consumed by the node.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::ConfigError;

/// The parts of a Tendermint node configuration the rollup node reads.
///
/// Absent keys take Tendermint's defaults. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TendermintConfig {
    /// Root directory; relative paths resolve against it.
    #[serde(skip)]
    pub root_dir: PathBuf,
    /// Address of the ABCI application, as configured for Tendermint.
    pub proxy_app: String,
    /// Human readable node name.
    pub moniker: String,
    /// Logging level, e.g. `info` or `main:info,state:debug,*:error`.
    pub log_level: String,
    /// Database directory.
    pub db_dir: String,
    /// Genesis file.
    pub genesis_file: String,
    /// Private validator key file.
    pub priv_validator_key_file: String,
    /// Private validator last sign state file.
    pub priv_validator_state_file: String,
    /// Node key file.
    pub node_key_file: String,
    /// `[rpc]` section.
    pub rpc: RpcConfig,
    /// `[p2p]` section.
    pub p2p: P2pConfig,
}

impl Default for TendermintConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::new(),
            proxy_app: "tcp://127.0.0.1:26658".to_string(),
            moniker: "anonymous".to_string(),
            log_level: "info".to_string(),
            db_dir: "data".to_string(),
            genesis_file: "config/genesis.json".to_string(),
            priv_validator_key_file: "config/priv_validator_key.json".to_string(),
            priv_validator_state_file: "data/priv_validator_state.json".to_string(),
            node_key_file: "config/node_key.json".to_string(),
            rpc: RpcConfig::default(),
            p2p: P2pConfig::default(),
        }
    }
}

/// `[rpc]` section of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// RPC listen address.
    pub laddr: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self { laddr: "tcp://127.0.0.1:26657".to_string() }
    }
}

/// `[p2p]` section of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct P2pConfig {
    /// P2P listen address.
    pub laddr: String,
    /// Comma separated `id@host:port` seed nodes.
    pub seeds: String,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self { laddr: "tcp://0.0.0.0:26656".to_string(), seeds: String::new() }
    }
}

impl TendermintConfig {
    /// Reads and validates `path`, resolving relative paths against `root_dir`.
    pub fn load(path: &Path, root_dir: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&raw)
            .map_err(|err| ConfigError::ParseConfig { path: path.to_path_buf(), source: err })?;
        config.root_dir = root_dir.to_path_buf();
        config.validate_basic()?;
        Ok(config)
    }

    /// Performs the basic sanity checks Tendermint runs on its configuration.
    pub fn validate_basic(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level must not be empty"));
        }
        let files = [
            (self.genesis_file.as_str(), "genesis_file must not be empty"),
            (self.priv_validator_key_file.as_str(), "priv_validator_key_file must not be empty"),
            (
                self.priv_validator_state_file.as_str(),
                "priv_validator_state_file must not be empty",
            ),
            (self.node_key_file.as_str(), "node_key_file must not be empty"),
        ];
        for (path, reason) in files {
            if path.trim().is_empty() {
                return Err(ConfigError::Invalid(reason));
            }
        }
        Ok(())
    }

    fn rooted(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }

    /// Database directory.
    pub fn db_dir(&self) -> PathBuf {
        self.rooted(&self.db_dir)
    }

    /// Genesis file.
    pub fn genesis_file(&self) -> PathBuf {
        self.rooted(&self.genesis_file)
    }

    /// Private validator key file.
    pub fn priv_validator_key_file(&self) -> PathBuf {
        self.rooted(&self.priv_validator_key_file)
    }

    /// Private validator state file.
    pub fn priv_validator_state_file(&self) -> PathBuf {
        self.rooted(&self.priv_validator_state_file)
    }

    /// Node key file.
    pub fn node_key_file(&self) -> PathBuf {
        self.rooted(&self.node_key_file)
    }
}
