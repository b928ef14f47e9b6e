//! In-memory [`AbciConnection`] for tests.

use std::sync::Arc;

use parking_lot::Mutex;
use tendermint_proto::abci::{
    RequestApplySnapshotChunk, RequestBeginBlock, RequestCheckTx, RequestDeliverTx,
    RequestEndBlock, RequestInfo, RequestInitChain, RequestListSnapshots,
    RequestLoadSnapshotChunk, RequestOfferSnapshot, RequestQuery, ResponseApplySnapshotChunk,
    ResponseBeginBlock, ResponseCheckTx, ResponseCommit, ResponseDeliverTx, ResponseEndBlock,
    ResponseInfo, ResponseInitChain, ResponseListSnapshots, ResponseLoadSnapshotChunk,
    ResponseOfferSnapshot, ResponseQuery,
};

use crate::{connection::AbciConnection, error::RelayError, types::AbciMethod};

/// A request recorded by [`MockConnection`].
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum MockRequest {
    Info(RequestInfo),
    CheckTx(RequestCheckTx),
    DeliverTx(RequestDeliverTx),
    Commit,
    Query(RequestQuery),
    InitChain(RequestInitChain),
    BeginBlock(RequestBeginBlock),
    EndBlock(RequestEndBlock),
    ListSnapshots(RequestListSnapshots),
    OfferSnapshot(RequestOfferSnapshot),
    LoadSnapshotChunk(RequestLoadSnapshotChunk),
    ApplySnapshotChunk(RequestApplySnapshotChunk),
}

impl MockRequest {
    /// The call kind of this request.
    pub const fn method(&self) -> AbciMethod {
        match self {
            Self::Info(_) => AbciMethod::Info,
            Self::CheckTx(_) => AbciMethod::CheckTx,
            Self::DeliverTx(_) => AbciMethod::DeliverTx,
            Self::Commit => AbciMethod::Commit,
            Self::Query(_) => AbciMethod::Query,
            Self::InitChain(_) => AbciMethod::InitChain,
            Self::BeginBlock(_) => AbciMethod::BeginBlock,
            Self::EndBlock(_) => AbciMethod::EndBlock,
            Self::ListSnapshots(_) => AbciMethod::ListSnapshots,
            Self::OfferSnapshot(_) => AbciMethod::OfferSnapshot,
            Self::LoadSnapshotChunk(_) => AbciMethod::LoadSnapshotChunk,
            Self::ApplySnapshotChunk(_) => AbciMethod::ApplySnapshotChunk,
        }
    }
}

/// Canned responses returned by [`MockConnection`].
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct MockResponses {
    pub info: ResponseInfo,
    pub check_tx: ResponseCheckTx,
    pub deliver_tx: ResponseDeliverTx,
    pub commit: ResponseCommit,
    pub query: ResponseQuery,
    pub init_chain: ResponseInitChain,
    pub begin_block: ResponseBeginBlock,
    pub end_block: ResponseEndBlock,
    pub list_snapshots: ResponseListSnapshots,
    pub offer_snapshot: ResponseOfferSnapshot,
    pub load_snapshot_chunk: ResponseLoadSnapshotChunk,
    pub apply_snapshot_chunk: ResponseApplySnapshotChunk,
}

impl Default for MockResponses {
    /// Non-default values wherever the message has a field, so a forwarded
    /// response can be told apart from a locally built empty one.
    fn default() -> Self {
        Self {
            info: ResponseInfo {
                data: "mock-app".to_string(),
                version: "0.1.0".to_string(),
                app_version: 1,
                last_block_height: 41,
                last_block_app_hash: vec![0xab; 32].into(),
            },
            check_tx: ResponseCheckTx {
                code: 0,
                data: b"checked".to_vec().into(),
                gas_wanted: 21_000,
                ..Default::default()
            },
            deliver_tx: ResponseDeliverTx {
                data: b"delivered".to_vec().into(),
                gas_used: 21_000,
                ..Default::default()
            },
            commit: ResponseCommit { data: vec![0xcd; 32].into(), retain_height: 10 },
            query: ResponseQuery {
                key: b"key".to_vec().into(),
                value: b"value".to_vec().into(),
                height: 41,
                ..Default::default()
            },
            init_chain: ResponseInitChain {
                app_hash: vec![0xef; 32].into(),
                ..Default::default()
            },
            begin_block: ResponseBeginBlock {
                events: vec![tendermint_proto::abci::Event {
                    r#type: "begin".to_string(),
                    ..Default::default()
                }],
            },
            end_block: ResponseEndBlock {
                events: vec![tendermint_proto::abci::Event {
                    r#type: "end".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            list_snapshots: ResponseListSnapshots {
                snapshots: vec![tendermint_proto::abci::Snapshot {
                    height: 40,
                    format: 1,
                    chunks: 2,
                    ..Default::default()
                }],
            },
            offer_snapshot: ResponseOfferSnapshot { result: 1 },
            load_snapshot_chunk: ResponseLoadSnapshotChunk { chunk: b"chunk".to_vec().into() },
            apply_snapshot_chunk: ResponseApplySnapshotChunk {
                result: 1,
                refetch_chunks: vec![3],
                reject_senders: vec!["peer".to_string()],
            },
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    requests: Vec<MockRequest>,
    responses: MockResponses,
    failure: Option<String>,
}

/// A connection that records every request and answers with canned responses.
///
/// Clones share state, so a test can keep a handle after moving one into a
/// relayer.
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    /// A connection answering with `responses`.
    pub fn with_responses(responses: MockResponses) -> Self {
        let conn = Self::default();
        conn.state.lock().responses = responses;
        conn
    }

    /// A connection whose every call fails with a transport error.
    pub fn failing(reason: impl Into<String>) -> Self {
        let conn = Self::default();
        conn.state.lock().failure = Some(reason.into());
        conn
    }

    /// The responses this connection answers with.
    pub fn responses(&self) -> MockResponses {
        self.state.lock().responses.clone()
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.state.lock().requests.clone()
    }

    /// The call kinds received so far, in order.
    pub fn calls(&self) -> Vec<AbciMethod> {
        self.state.lock().requests.iter().map(MockRequest::method).collect()
    }

    fn record<T>(
        &self,
        req: MockRequest,
        respond: impl FnOnce(&MockResponses) -> T,
    ) -> Result<T, RelayError> {
        let mut state = self.state.lock();
        let method = req.method();
        state.requests.push(req);
        if let Some(reason) = &state.failure {
            return Err(RelayError::transport(method, reason));
        }
        Ok(respond(&state.responses))
    }
}

impl AbciConnection for MockConnection {
    fn info(&mut self, req: RequestInfo) -> Result<ResponseInfo, RelayError> {
        self.record(MockRequest::Info(req), |r| r.info.clone())
    }

    fn check_tx(&mut self, req: RequestCheckTx) -> Result<ResponseCheckTx, RelayError> {
        self.record(MockRequest::CheckTx(req), |r| r.check_tx.clone())
    }

    fn deliver_tx(&mut self, req: RequestDeliverTx) -> Result<ResponseDeliverTx, RelayError> {
        self.record(MockRequest::DeliverTx(req), |r| r.deliver_tx.clone())
    }

    fn commit(&mut self) -> Result<ResponseCommit, RelayError> {
        self.record(MockRequest::Commit, |r| r.commit.clone())
    }

    fn query(&mut self, req: RequestQuery) -> Result<ResponseQuery, RelayError> {
        self.record(MockRequest::Query(req), |r| r.query.clone())
    }

    fn init_chain(&mut self, req: RequestInitChain) -> Result<ResponseInitChain, RelayError> {
        self.record(MockRequest::InitChain(req), |r| r.init_chain.clone())
    }

    fn begin_block(&mut self, req: RequestBeginBlock) -> Result<ResponseBeginBlock, RelayError> {
        self.record(MockRequest::BeginBlock(req), |r| r.begin_block.clone())
    }

    fn end_block(&mut self, req: RequestEndBlock) -> Result<ResponseEndBlock, RelayError> {
        self.record(MockRequest::EndBlock(req), |r| r.end_block.clone())
    }

    fn list_snapshots(
        &mut self,
        req: RequestListSnapshots,
    ) -> Result<ResponseListSnapshots, RelayError> {
        self.record(MockRequest::ListSnapshots(req), |r| r.list_snapshots.clone())
    }

    fn offer_snapshot(
        &mut self,
        req: RequestOfferSnapshot,
    ) -> Result<ResponseOfferSnapshot, RelayError> {
        self.record(MockRequest::OfferSnapshot(req), |r| r.offer_snapshot.clone())
    }

    fn load_snapshot_chunk(
        &mut self,
        req: RequestLoadSnapshotChunk,
    ) -> Result<ResponseLoadSnapshotChunk, RelayError> {
        self.record(MockRequest::LoadSnapshotChunk(req), |r| r.load_snapshot_chunk.clone())
    }

    fn apply_snapshot_chunk(
        &mut self,
        req: RequestApplySnapshotChunk,
    ) -> Result<ResponseApplySnapshotChunk, RelayError> {
        self.record(MockRequest::ApplySnapshotChunk(req), |r| r.apply_snapshot_chunk.clone())
    }
}
