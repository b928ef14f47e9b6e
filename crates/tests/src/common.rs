//! Shared fixtures for the relay integration tests.

use std::{
    net::TcpListener,
    path::{Path, PathBuf},
    sync::Arc,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use eyre::Result;
use parking_lot::Mutex;
use relay_common::constants::DEFAULT_READ_BUF_SIZE;
use tempfile::TempDir;
use tendermint_abci::{Application, ServerBuilder};
use tendermint_proto::abci::{
    RequestBeginBlock, RequestCheckTx, RequestDeliverTx, RequestEndBlock, RequestInfo,
    RequestInitChain, RequestOfferSnapshot, RequestQuery, ResponseBeginBlock, ResponseCheckTx,
    ResponseCommit, ResponseDeliverTx, ResponseEndBlock, ResponseInfo, ResponseInitChain,
    ResponseListSnapshots, ResponseOfferSnapshot, ResponseQuery, Snapshot,
};

/// Chain id written to the fixture genesis.
pub const TEST_CHAIN_ID: &str = "relay-test";
/// `data` reported by [`RecordingApp`] on `Info`.
pub const APP_NAME: &str = "recording-app";
/// App hash returned by [`RecordingApp`] on `Commit`.
pub const APP_HASH: [u8; 32] = [0x42; 32];
/// Gas [`RecordingApp`] asks for on every `CheckTx`.
pub const CHECK_TX_GAS: i64 = 21_000;
/// Height of the only snapshot [`RecordingApp`] lists.
pub const SNAPSHOT_HEIGHT: u64 = 100;

/// An ABCI application that records the calls it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingApp {
    calls: Arc<Mutex<Vec<String>>>,
    txs: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingApp {
    /// Names of the calls received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Transactions delivered so far, in order.
    pub fn txs(&self) -> Vec<Vec<u8>> {
        self.txs.lock().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }
}

impl Application for RecordingApp {
    fn info(&self, request: RequestInfo) -> ResponseInfo {
        self.record("info");
        ResponseInfo {
            data: APP_NAME.to_string(),
            version: request.version,
            app_version: 1,
            last_block_height: 0,
            last_block_app_hash: Default::default(),
        }
    }

    fn query(&self, request: RequestQuery) -> ResponseQuery {
        self.record("query");
        ResponseQuery {
            key: request.data.clone(),
            value: request.data,
            height: request.height,
            ..Default::default()
        }
    }

    fn begin_block(&self, request: RequestBeginBlock) -> ResponseBeginBlock {
        let height = request.header.map(|header| header.height).unwrap_or_default();
        self.record(&format!("begin_block:{height}"));
        ResponseBeginBlock::default()
    }

    fn deliver_tx(&self, request: RequestDeliverTx) -> ResponseDeliverTx {
        self.record("deliver_tx");
        self.txs.lock().push(request.tx.to_vec());
        ResponseDeliverTx { data: request.tx, ..Default::default() }
    }

    fn check_tx(&self, request: RequestCheckTx) -> ResponseCheckTx {
        self.record("check_tx");
        ResponseCheckTx { data: request.tx, gas_wanted: CHECK_TX_GAS, ..Default::default() }
    }

    fn init_chain(&self, request: RequestInitChain) -> ResponseInitChain {
        self.record(&format!("init_chain:{}", request.chain_id));
        ResponseInitChain { app_hash: APP_HASH.to_vec().into(), ..Default::default() }
    }

    fn end_block(&self, request: RequestEndBlock) -> ResponseEndBlock {
        self.record(&format!("end_block:{}", request.height));
        ResponseEndBlock::default()
    }

    fn list_snapshots(&self) -> ResponseListSnapshots {
        self.record("list_snapshots");
        ResponseListSnapshots {
            snapshots: vec![Snapshot { height: SNAPSHOT_HEIGHT, format: 1, chunks: 4, ..Default::default() }],
        }
    }

    fn offer_snapshot(&self, request: RequestOfferSnapshot) -> ResponseOfferSnapshot {
        let height = request.snapshot.map(|snapshot| snapshot.height).unwrap_or_default();
        self.record(&format!("offer_snapshot:{height}"));
        // ACCEPT
        ResponseOfferSnapshot { result: 1 }
    }

    fn commit(&self) -> ResponseCommit {
        self.record("commit");
        ResponseCommit { data: APP_HASH.to_vec().into(), retain_height: 0 }
    }
}

/// Serves `app` on an ephemeral local port and returns the bound address.
pub fn serve<A: Application>(app: A) -> Result<String> {
    let server = ServerBuilder::new(DEFAULT_READ_BUF_SIZE)
        .bind("127.0.0.1:0", app)
        .map_err(|err| eyre::eyre!("failed to bind test server: {err}"))?;
    let addr = server.local_addr();
    std::thread::Builder::new().name("test-abci-server".to_string()).spawn(move || {
        let _ = server.listen();
    })?;
    Ok(addr)
}

/// A local address nothing listens on.
pub fn closed_addr() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();
    drop(listener);
    Ok(addr)
}

/// A local address that accepts connections and closes them at once.
///
/// Connecting succeeds; every call sent afterwards fails.
pub fn hangup_addr() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();
    std::thread::Builder::new().name("test-hangup".to_string()).spawn(move || {
        for stream in listener.incoming() {
            drop(stream);
        }
    })?;
    Ok(addr)
}

/// A Tendermint home directory with config, keys and genesis.
#[derive(Debug)]
pub struct TendermintHome {
    /// Owns the directory.
    pub dir: TempDir,
}

impl TendermintHome {
    /// Writes a complete home directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("config");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&config)?;
        std::fs::create_dir_all(&data)?;

        std::fs::write(
            config.join("config.toml"),
            "moniker = \"integration\"\nlog_level = \"main:info,*:error\"\n\n\
             [p2p]\nladdr = \"tcp://0.0.0.0:26656\"\nseeds = \"\"\n",
        )?;
        std::fs::write(
            config.join("genesis.json"),
            format!(
                r#"{{"genesis_time":"2023-01-01T00:00:00Z","chain_id":"{TEST_CHAIN_ID}","initial_height":"1","app_state":{{}}}}"#
            ),
        )?;
        std::fs::write(
            config.join("priv_validator_key.json"),
            format!(r#"{{"address":"A1B2","priv_key":{}}}"#, ed25519_key(1)),
        )?;
        std::fs::write(
            data.join("priv_validator_state.json"),
            r#"{"height":"0","round":0,"step":0}"#,
        )?;
        std::fs::write(config.join("node_key.json"), format!(r#"{{"priv_key":{}}}"#, ed25519_key(2)))?;

        Ok(Self { dir })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `config.toml`.
    pub fn config_file(&self) -> PathBuf {
        self.dir.path().join("config/config.toml")
    }
}

fn ed25519_key(fill: u8) -> String {
    format!(r#"{{"type":"tendermint/PrivKeyEd25519","value":"{}"}}"#, STANDARD.encode([fill; 64]))
}
