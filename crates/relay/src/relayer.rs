//! Forwarding of ABCI calls to the downstream application.
//!
//! [`AbciRelayer`] owns the single connection. `BeginBlock` at height 1 and
//! the fraud proof extension calls are answered without contacting it.

use std::{sync::Arc, time::Instant};

use parking_lot::Mutex;
use tendermint_abci::Client;
use tendermint_proto::abci::{
    RequestApplySnapshotChunk, RequestBeginBlock, RequestCheckTx, RequestDeliverTx,
    RequestEndBlock, RequestInfo, RequestInitChain, RequestListSnapshots,
    RequestLoadSnapshotChunk, RequestOfferSnapshot, RequestQuery, ResponseApplySnapshotChunk,
    ResponseBeginBlock, ResponseCheckTx, ResponseCommit, ResponseDeliverTx, ResponseEndBlock,
    ResponseInfo, ResponseInitChain, ResponseListSnapshots, ResponseLoadSnapshotChunk,
    ResponseOfferSnapshot, ResponseQuery,
};
use tracing::{debug, error, trace};

use crate::{
    connection::{connect, AbciConnection},
    error::RelayError,
    types::{
        AbciMethod, RequestGenerateFraudProof, RequestGetAppHash, RequestVerifyFraudProof,
        ResponseGenerateFraudProof, ResponseGetAppHash, ResponseVerifyFraudProof,
    },
};

/// Block height whose `BeginBlock` is answered locally.
///
/// The downstream application fails to decode the first block's `BeginBlock`,
/// so it is never sent.
pub const SKIPPED_BEGIN_BLOCK_HEIGHT: i64 = 1;

fn init_metrics() {
    metrics::describe_counter!(
        "abci_relay_requests_total",
        "Total ABCI calls forwarded to the downstream application"
    );
    metrics::describe_counter!(
        "abci_relay_errors_total",
        "Total transport failures while forwarding ABCI calls"
    );
    metrics::describe_histogram!(
        "abci_relay_latency_ms",
        "Round-trip latency of forwarded ABCI calls (ms)"
    );
}

/// Forwards ABCI calls to a downstream application over a single connection.
///
/// Clones share the connection; concurrent calls are serialized on it.
pub struct AbciRelayer<C = Client> {
    conn: Arc<Mutex<C>>,
}

impl<C> Clone for AbciRelayer<C> {
    fn clone(&self) -> Self {
        Self { conn: Arc::clone(&self.conn) }
    }
}

impl<C> std::fmt::Debug for AbciRelayer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbciRelayer").finish_non_exhaustive()
    }
}

impl AbciRelayer<Client> {
    /// Connects to the ABCI application at `address` (`host:port`).
    pub fn connect(address: &str, read_buf_size: usize) -> Result<Self, RelayError> {
        let client = connect(address, read_buf_size)?;
        debug!(%address, "Connected to downstream ABCI application");
        Ok(Self::new(client))
    }
}

impl<C: AbciConnection> AbciRelayer<C> {
    /// Creates a relayer over an already established connection.
    pub fn new(conn: C) -> Self {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(init_metrics);

        Self { conn: Arc::new(Mutex::new(conn)) }
    }

    fn relay<T>(
        &self,
        method: AbciMethod,
        call: impl FnOnce(&mut C) -> Result<T, RelayError>,
    ) -> Result<T, RelayError> {
        trace!(%method, "Relaying ABCI call");
        metrics::counter!("abci_relay_requests_total", "method" => method.as_str()).increment(1);

        let start = Instant::now();
        let res = {
            let mut conn = self.conn.lock();
            call(&mut *conn)
        };
        metrics::histogram!("abci_relay_latency_ms").record(start.elapsed().as_secs_f64() * 1e3);

        if let Err(err) = &res {
            metrics::counter!("abci_relay_errors_total", "method" => method.as_str()).increment(1);
            error!(%method, %err, "Downstream ABCI call failed");
        }
        res
    }

    /// Relays `Info`.
    pub fn info(&self, req: RequestInfo) -> Result<ResponseInfo, RelayError> {
        self.relay(AbciMethod::Info, |conn| conn.info(req))
    }

    /// Relays `CheckTx`.
    pub fn check_tx(&self, req: RequestCheckTx) -> Result<ResponseCheckTx, RelayError> {
        self.relay(AbciMethod::CheckTx, |conn| conn.check_tx(req))
    }

    /// Relays `DeliverTx`.
    pub fn deliver_tx(&self, req: RequestDeliverTx) -> Result<ResponseDeliverTx, RelayError> {
        self.relay(AbciMethod::DeliverTx, |conn| conn.deliver_tx(req))
    }

    /// Relays `Commit`.
    pub fn commit(&self) -> Result<ResponseCommit, RelayError> {
        self.relay(AbciMethod::Commit, |conn| conn.commit())
    }

    /// Relays `Query`.
    pub fn query(&self, req: RequestQuery) -> Result<ResponseQuery, RelayError> {
        self.relay(AbciMethod::Query, |conn| conn.query(req))
    }

    /// Relays `InitChain`.
    pub fn init_chain(&self, req: RequestInitChain) -> Result<ResponseInitChain, RelayError> {
        self.relay(AbciMethod::InitChain, |conn| conn.init_chain(req))
    }

    /// Relays `BeginBlock`, except at height 1 where an empty response is
    /// returned without contacting the application.
    pub fn begin_block(&self, req: RequestBeginBlock) -> Result<ResponseBeginBlock, RelayError> {
        let height = req.header.as_ref().map(|header| header.height).unwrap_or_default();
        if height == SKIPPED_BEGIN_BLOCK_HEIGHT {
            debug!(height, "Answering BeginBlock locally");
            return Ok(ResponseBeginBlock::default());
        }
        self.relay(AbciMethod::BeginBlock, |conn| conn.begin_block(req))
    }

    /// Relays `EndBlock`.
    pub fn end_block(&self, req: RequestEndBlock) -> Result<ResponseEndBlock, RelayError> {
        self.relay(AbciMethod::EndBlock, |conn| conn.end_block(req))
    }

    /// Relays `ListSnapshots`.
    pub fn list_snapshots(
        &self,
        req: RequestListSnapshots,
    ) -> Result<ResponseListSnapshots, RelayError> {
        self.relay(AbciMethod::ListSnapshots, |conn| conn.list_snapshots(req))
    }

    /// Relays `OfferSnapshot`.
    pub fn offer_snapshot(
        &self,
        req: RequestOfferSnapshot,
    ) -> Result<ResponseOfferSnapshot, RelayError> {
        self.relay(AbciMethod::OfferSnapshot, |conn| conn.offer_snapshot(req))
    }

    /// Relays `LoadSnapshotChunk`.
    pub fn load_snapshot_chunk(
        &self,
        req: RequestLoadSnapshotChunk,
    ) -> Result<ResponseLoadSnapshotChunk, RelayError> {
        self.relay(AbciMethod::LoadSnapshotChunk, |conn| conn.load_snapshot_chunk(req))
    }

    /// Relays `ApplySnapshotChunk`.
    pub fn apply_snapshot_chunk(
        &self,
        req: RequestApplySnapshotChunk,
    ) -> Result<ResponseApplySnapshotChunk, RelayError> {
        self.relay(AbciMethod::ApplySnapshotChunk, |conn| conn.apply_snapshot_chunk(req))
    }

    /// Fraud proof generation is not supported; always the empty response.
    pub fn generate_fraud_proof(
        &self,
        _req: RequestGenerateFraudProof,
    ) -> ResponseGenerateFraudProof {
        ResponseGenerateFraudProof::default()
    }

    /// Fraud proof verification is not supported; always the empty response.
    pub fn verify_fraud_proof(&self, _req: RequestVerifyFraudProof) -> ResponseVerifyFraudProof {
        ResponseVerifyFraudProof::default()
    }

    /// App hash retrieval is not supported; always the empty response.
    pub fn get_app_hash(&self, _req: RequestGetAppHash) -> ResponseGetAppHash {
        ResponseGetAppHash::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{MockConnection, MockRequest},
        types::FraudProof,
    };
    use tendermint_proto::types::Header;

    fn begin_block_at(height: i64) -> RequestBeginBlock {
        RequestBeginBlock {
            header: Some(Header { height, ..Default::default() }),
            ..Default::default()
        }
    }

    #[test]
    fn forwards_responses_unchanged() {
        let mock = MockConnection::default();
        let expected = mock.responses();
        let relayer = AbciRelayer::new(mock.clone());

        assert_eq!(relayer.info(RequestInfo::default()).unwrap(), expected.info);
        assert_eq!(relayer.check_tx(RequestCheckTx::default()).unwrap(), expected.check_tx);
        assert_eq!(relayer.deliver_tx(RequestDeliverTx::default()).unwrap(), expected.deliver_tx);
        assert_eq!(relayer.commit().unwrap(), expected.commit);
        assert_eq!(relayer.query(RequestQuery::default()).unwrap(), expected.query);
        assert_eq!(relayer.init_chain(RequestInitChain::default()).unwrap(), expected.init_chain);
        assert_eq!(relayer.begin_block(begin_block_at(2)).unwrap(), expected.begin_block);
        assert_eq!(relayer.end_block(RequestEndBlock::default()).unwrap(), expected.end_block);
        assert_eq!(
            relayer.list_snapshots(RequestListSnapshots::default()).unwrap(),
            expected.list_snapshots
        );
        assert_eq!(
            relayer.offer_snapshot(RequestOfferSnapshot::default()).unwrap(),
            expected.offer_snapshot
        );
        assert_eq!(
            relayer.load_snapshot_chunk(RequestLoadSnapshotChunk::default()).unwrap(),
            expected.load_snapshot_chunk
        );
        assert_eq!(
            relayer.apply_snapshot_chunk(RequestApplySnapshotChunk::default()).unwrap(),
            expected.apply_snapshot_chunk
        );

        assert_eq!(mock.calls().len(), 12);
    }

    #[test]
    fn forwards_requests_unchanged() {
        let mock = MockConnection::default();
        let relayer = AbciRelayer::new(mock.clone());

        let req = RequestDeliverTx { tx: b"transfer 10".to_vec().into() };
        relayer.deliver_tx(req.clone()).unwrap();
        let query = RequestQuery { path: "/store".to_string(), height: 7, ..Default::default() };
        relayer.query(query.clone()).unwrap();

        assert_eq!(mock.requests(), vec![MockRequest::DeliverTx(req), MockRequest::Query(query)]);
    }

    #[test]
    fn begin_block_at_height_one_is_not_forwarded() {
        let mock = MockConnection::default();
        let relayer = AbciRelayer::new(mock.clone());

        let res = relayer.begin_block(begin_block_at(1)).unwrap();

        assert_eq!(res, ResponseBeginBlock::default());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn begin_block_at_other_heights_is_forwarded() {
        let mock = MockConnection::default();
        let expected = mock.responses().begin_block;
        let relayer = AbciRelayer::new(mock.clone());

        for height in [0, 2, 100] {
            let req = begin_block_at(height);
            assert_eq!(relayer.begin_block(req.clone()).unwrap(), expected);
            assert_eq!(mock.requests().last(), Some(&MockRequest::BeginBlock(req)));
        }

        // A missing header reads as height 0.
        relayer.begin_block(RequestBeginBlock::default()).unwrap();
        assert_eq!(mock.calls(), vec![AbciMethod::BeginBlock; 4]);
    }

    #[test]
    fn unsupported_calls_return_defaults() {
        let mock = MockConnection::failing("must not be called");
        let relayer = AbciRelayer::new(mock.clone());

        let proof = FraudProof {
            block_height: 12,
            pre_state_app_hash: vec![1; 32],
            expected_valid_app_hash: vec![2; 32],
            ..Default::default()
        };
        let generated = relayer.generate_fraud_proof(RequestGenerateFraudProof {
            begin_block_request: Some(begin_block_at(12)),
            ..Default::default()
        });
        let verified = relayer.verify_fraud_proof(RequestVerifyFraudProof {
            fraud_proof: Some(proof),
            expected_valid_app_hash: vec![2; 32],
        });
        let app_hash = relayer.get_app_hash(RequestGetAppHash);

        assert_eq!(generated, ResponseGenerateFraudProof::default());
        assert_eq!(verified, ResponseVerifyFraudProof { success: false });
        assert_eq!(app_hash, ResponseGetAppHash::default());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn transport_failures_are_returned() {
        let mock = MockConnection::failing("connection reset by peer");
        let relayer = AbciRelayer::new(mock);

        let err = relayer.commit().unwrap_err();
        assert_eq!(
            err,
            RelayError::Transport {
                method: AbciMethod::Commit,
                reason: "connection reset by peer".to_string()
            }
        );

        let err = relayer.offer_snapshot(RequestOfferSnapshot::default()).unwrap_err();
        assert!(matches!(err, RelayError::Transport { method: AbciMethod::OfferSnapshot, .. }));
    }

    #[test]
    fn clones_share_the_connection() {
        let mock = MockConnection::default();
        let relayer = AbciRelayer::new(mock.clone());
        let other = relayer.clone();

        relayer.commit().unwrap();
        other.commit().unwrap();

        assert_eq!(mock.calls(), vec![AbciMethod::Commit, AbciMethod::Commit]);
    }
}
