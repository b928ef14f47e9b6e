//! JSON-RPC `broadcast_tx_async` client with rate limiting and round-robin endpoints.

use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Instant,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use governor::{
    clock::DefaultClock,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::trace;

/// Initialize metrics
fn init_metrics() {
    metrics::describe_histogram!(
        "loadgen_broadcast_latency_ms",
        "Round-trip latency of broadcast_tx_async calls (ms)"
    );
    metrics::describe_counter!(
        "loadgen_broadcast_errors_total",
        "Total errors encountered while broadcasting"
    );
    metrics::describe_counter!("loadgen_txs_broadcast_total", "Total transactions broadcast");
}

/// Result of a successful `broadcast_tx_async` call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastReceipt {
    /// `CheckTx` code; zero when accepted.
    #[serde(default)]
    pub code: u32,
    /// Log reported by the node.
    #[serde(default)]
    pub log: String,
    /// Transaction hash, hex.
    #[serde(default)]
    pub hash: String,
}

impl BroadcastReceipt {
    /// Whether the node accepted the transaction.
    pub const fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Broadcasts transactions to Tendermint RPC endpoints in round-robin order
#[derive(Clone, Debug)]
pub struct TxBroadcaster {
    client: reqwest::Client,
    endpoints: Arc<[reqwest::Url]>,
    next: Arc<AtomicUsize>,
    ids: Arc<AtomicU64>,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    queue: Arc<Semaphore>,
}

impl TxBroadcaster {
    /// Construct a new broadcaster.
    ///
    /// * `endpoints` – Tendermint RPC endpoints (e.g. <http://localhost:26657>).
    /// * `max_in_flight` – Maximum number of in-flight requests (mapped onto a semaphore,
    ///   capped at [`Semaphore::MAX_PERMITS`]).
    /// * `rate_limit_per_sec` – Maximum requests per second across all endpoints.
    pub fn new(
        endpoints: Vec<reqwest::Url>,
        max_in_flight: usize,
        rate_limit_per_sec: NonZeroU32,
        client: Option<reqwest::Client>,
    ) -> Result<Self, BroadcastError> {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(init_metrics);

        if endpoints.is_empty() {
            return Err(BroadcastError::NoEndpoints);
        }
        Ok(Self {
            client: client.unwrap_or_default(),
            endpoints: endpoints.into(),
            next: Arc::new(AtomicUsize::new(0)),
            ids: Arc::new(AtomicU64::new(1)),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate_limit_per_sec))),
            queue: Arc::new(Semaphore::new(max_in_flight.min(Semaphore::MAX_PERMITS))),
        })
    }

    fn next_endpoint(&self) -> &reqwest::Url {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        &self.endpoints[idx]
    }

    /// Broadcasts `tx` with `broadcast_tx_async` and returns the node's receipt.
    ///
    /// Waits for an in-flight permit and the rate limiter before sending.
    pub async fn broadcast(&self, tx: Bytes) -> Result<BroadcastReceipt, BroadcastError> {
        let _permit = self.queue.clone().acquire_owned().await.map_err(|_| BroadcastError::Shutdown)?;
        self.limiter.until_ready().await;

        let endpoint = self.next_endpoint();
        let payload = json!({
            "jsonrpc": "2.0",
            "id": self.ids.fetch_add(1, Ordering::Relaxed),
            "method": "broadcast_tx_async",
            "params": { "tx": STANDARD.encode(&tx) },
        });

        trace!(%endpoint, len = tx.len(), "Broadcasting tx");
        let start = Instant::now();
        let resp = self.client.post(endpoint.clone()).json(&payload).send().await.map_err(|err| {
            metrics::counter!("loadgen_broadcast_errors_total", "class" => "network").increment(1);
            BroadcastError::Network(err)
        })?;
        metrics::histogram!("loadgen_broadcast_latency_ms")
            .record(start.elapsed().as_secs_f64() * 1e3);

        if !resp.status().is_success() {
            let class = resp.status().as_u16().to_string();
            metrics::counter!("loadgen_broadcast_errors_total", "class" => class).increment(1);
            return Err(BroadcastError::HttpStatus(resp.status()));
        }

        let json: serde_json::Value = resp.json().await.map_err(BroadcastError::InvalidJson)?;
        if let Some(result) = json.get("result") {
            let receipt = BroadcastReceipt::deserialize(result)
                .map_err(|_| BroadcastError::UnexpectedBody(json.clone()))?;
            metrics::counter!("loadgen_txs_broadcast_total").increment(1);
            return Ok(receipt);
        }

        if json.get("error").is_some() {
            metrics::counter!("loadgen_broadcast_errors_total", "class" => "upstream").increment(1);
            return Err(BroadcastError::UpstreamError(json));
        }

        metrics::counter!("loadgen_broadcast_errors_total", "class" => "invalid_body").increment(1);
        Err(BroadcastError::UnexpectedBody(json))
    }
}

/// Errors that can occur while broadcasting
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// No endpoint to broadcast to
    #[error("No RPC endpoints configured")]
    NoEndpoints,
    /// Broadcaster is shutting down
    #[error("Broadcaster shutting down")]
    Shutdown,
    /// Network error occurred
    #[error("Network error: {0}")]
    Network(reqwest::Error),
    /// Node returned non-success HTTP status
    #[error("Node returned HTTP status {0}")]
    HttpStatus(StatusCode),
    /// Failed to parse JSON response
    #[error("Invalid JSON body")]
    InvalidJson(reqwest::Error),
    /// Response body was unexpected
    #[error("Unexpected body: {0:?}")]
    UnexpectedBody(serde_json::Value),
    /// Node returned a JSON-RPC error object
    #[error("Upstream JSON-RPC error: {0}")]
    UpstreamError(serde_json::Value),
}
