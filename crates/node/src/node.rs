//! Rollup node lifecycle: loads its inputs and serves ABCI on a background thread.

use std::{path::PathBuf, sync::Arc, thread::JoinHandle};

use tendermint_abci::{Application, ServerBuilder};
use tracing::{debug, info};

use crate::{
    config::NodeConfig,
    genesis::GenesisDoc,
    keys::{NodeKey, PrivValidator},
};

/// A rollup node serving an ABCI application to the node runtime.
///
/// Construction loads every on-disk input; [`RollupNode::start`] binds the
/// listen address and serves.
#[derive(Debug)]
pub struct RollupNode<A> {
    config: Arc<NodeConfig>,
    app: A,
    validator: PrivValidator,
    node_key: NodeKey,
    genesis: GenesisDoc,
}

impl<A: Application> RollupNode<A> {
    /// Loads the validator key, node key and genesis named by `config`.
    pub fn new(config: impl Into<Arc<NodeConfig>>, app: A) -> Result<Self, NodeError> {
        let config = config.into();
        let tm = &config.tendermint;

        let validator =
            PrivValidator::load(&tm.priv_validator_key_file(), &tm.priv_validator_state_file())?;
        let node_key = NodeKey::load(&tm.node_key_file())?;
        let genesis = GenesisDoc::load(&tm.genesis_file())?;

        debug!(
            chain_id = %genesis.chain_id,
            initial_height = genesis.initial_height,
            validator = %validator.address,
            "Loaded node inputs"
        );
        Ok(Self { config, app, validator, node_key, genesis })
    }

    /// The node configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The genesis document.
    pub const fn genesis(&self) -> &GenesisDoc {
        &self.genesis
    }

    /// The block signing key.
    pub const fn validator(&self) -> &PrivValidator {
        &self.validator
    }

    /// The p2p identity key.
    pub const fn node_key(&self) -> &NodeKey {
        &self.node_key
    }

    /// Binds the listen address and serves the application on a dedicated
    /// thread.
    pub fn start(self) -> Result<NodeHandle, NodeError> {
        let address = self.config.listen_address.clone();
        let server = ServerBuilder::new(self.config.read_buf_size)
            .bind(address.as_str(), self.app)
            .map_err(|err| NodeError::Bind { address: address.clone(), reason: err.to_string() })?;
        let local_addr = server.local_addr();

        let rollkit = &self.config.rollkit;
        info!(
            %local_addr,
            chain_id = %self.genesis.chain_id,
            aggregator = rollkit.aggregator,
            namespace_id = %rollkit.namespace_id,
            da_layer = %rollkit.da_layer,
            block_time = ?rollkit.block_manager.block_time,
            "Rollup node started"
        );

        let thread = std::thread::Builder::new()
            .name("abci-server".to_string())
            .spawn(move || server.listen().map_err(|err| NodeError::Server(err.to_string())))
            .map_err(NodeError::Spawn)?;

        Ok(NodeHandle { local_addr, thread })
    }
}

/// Handle to a started [`RollupNode`].
#[derive(Debug)]
pub struct NodeHandle {
    local_addr: String,
    thread: JoinHandle<Result<(), NodeError>>,
}

impl NodeHandle {
    /// The address the ABCI server is bound to.
    pub fn local_addr(&self) -> &str {
        &self.local_addr
    }

    /// Whether the server thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Blocks until the server thread exits.
    pub fn wait(self) -> Result<(), NodeError> {
        self.thread.join().map_err(|_| NodeError::ServerPanicked)?
    }
}

/// Errors that can occur while loading or running the node
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("failed to read {path}: {source}")]
    /// An input file could not be read.
    ReadFile {
        /// The file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    /// An input file is not valid JSON for its type.
    ParseFile {
        /// The file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    #[error("invalid key in {path}: {reason}")]
    /// A key file holds an unsupported or malformed key.
    InvalidKey {
        /// The file.
        path: PathBuf,
        /// Why the key was rejected.
        reason: String,
    },
    #[error("invalid genesis {path}: {reason}")]
    /// The genesis document failed validation.
    InvalidGenesis {
        /// The file.
        path: PathBuf,
        /// Why the document was rejected.
        reason: String,
    },
    #[error("failed to bind ABCI server to {address}: {reason}")]
    /// The listen address could not be bound.
    Bind {
        /// The listen address.
        address: String,
        /// Underlying error message.
        reason: String,
    },
    #[error("failed to spawn server thread: {0}")]
    /// The server thread could not be spawned.
    Spawn(std::io::Error),
    #[error("ABCI server failed: {0}")]
    /// The server stopped with an error.
    Server(String),
    #[error("ABCI server thread panicked")]
    /// The server thread panicked.
    ServerPanicked,
    #[error("failed to initialize logging: {0}")]
    /// The tracing subscriber could not be installed.
    Logging(String),
}
