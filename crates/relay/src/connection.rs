//! Connection to the downstream ABCI application.

use tendermint_abci::{Client, ClientBuilder};
use tendermint_proto::abci::{
    RequestApplySnapshotChunk, RequestBeginBlock, RequestCheckTx, RequestDeliverTx,
    RequestEndBlock, RequestInfo, RequestInitChain, RequestListSnapshots,
    RequestLoadSnapshotChunk, RequestOfferSnapshot, RequestQuery, ResponseApplySnapshotChunk,
    ResponseBeginBlock, ResponseCheckTx, ResponseCommit, ResponseDeliverTx, ResponseEndBlock,
    ResponseInfo, ResponseInitChain, ResponseListSnapshots, ResponseLoadSnapshotChunk,
    ResponseOfferSnapshot, ResponseQuery,
};
use tracing::debug;

use crate::{error::RelayError, types::AbciMethod};

/// A synchronous request/response channel to an ABCI application.
///
/// Every call blocks until the application replies or the transport fails.
pub trait AbciConnection: Send + 'static {
    /// Forwards `Info`.
    fn info(&mut self, req: RequestInfo) -> Result<ResponseInfo, RelayError>;
    /// Forwards `CheckTx`.
    fn check_tx(&mut self, req: RequestCheckTx) -> Result<ResponseCheckTx, RelayError>;
    /// Forwards `DeliverTx`.
    fn deliver_tx(&mut self, req: RequestDeliverTx) -> Result<ResponseDeliverTx, RelayError>;
    /// Forwards `Commit`.
    fn commit(&mut self) -> Result<ResponseCommit, RelayError>;
    /// Forwards `Query`.
    fn query(&mut self, req: RequestQuery) -> Result<ResponseQuery, RelayError>;
    /// Forwards `InitChain`.
    fn init_chain(&mut self, req: RequestInitChain) -> Result<ResponseInitChain, RelayError>;
    /// Forwards `BeginBlock`.
    fn begin_block(&mut self, req: RequestBeginBlock) -> Result<ResponseBeginBlock, RelayError>;
    /// Forwards `EndBlock`.
    fn end_block(&mut self, req: RequestEndBlock) -> Result<ResponseEndBlock, RelayError>;
    /// Forwards `ListSnapshots`.
    fn list_snapshots(
        &mut self,
        req: RequestListSnapshots,
    ) -> Result<ResponseListSnapshots, RelayError>;
    /// Forwards `OfferSnapshot`.
    fn offer_snapshot(
        &mut self,
        req: RequestOfferSnapshot,
    ) -> Result<ResponseOfferSnapshot, RelayError>;
    /// Forwards `LoadSnapshotChunk`.
    fn load_snapshot_chunk(
        &mut self,
        req: RequestLoadSnapshotChunk,
    ) -> Result<ResponseLoadSnapshotChunk, RelayError>;
    /// Forwards `ApplySnapshotChunk`.
    fn apply_snapshot_chunk(
        &mut self,
        req: RequestApplySnapshotChunk,
    ) -> Result<ResponseApplySnapshotChunk, RelayError>;
}

/// Opens a persistent socket connection to the ABCI application at `address`.
///
/// `address` must be a plain `host:port`.
pub fn connect(address: &str, read_buf_size: usize) -> Result<Client, RelayError> {
    debug!(%address, read_buf_size, "Connecting to ABCI application");
    ClientBuilder::new(read_buf_size)
        .connect(address)
        .map_err(|err| RelayError::connect(address, err))
}

impl AbciConnection for Client {
    fn info(&mut self, req: RequestInfo) -> Result<ResponseInfo, RelayError> {
        Self::info(self, req).map_err(|e| RelayError::transport(AbciMethod::Info, e))
    }

    fn check_tx(&mut self, req: RequestCheckTx) -> Result<ResponseCheckTx, RelayError> {
        Self::check_tx(self, req).map_err(|e| RelayError::transport(AbciMethod::CheckTx, e))
    }

    fn deliver_tx(&mut self, req: RequestDeliverTx) -> Result<ResponseDeliverTx, RelayError> {
        Self::deliver_tx(self, req).map_err(|e| RelayError::transport(AbciMethod::DeliverTx, e))
    }

    fn commit(&mut self) -> Result<ResponseCommit, RelayError> {
        Self::commit(self).map_err(|e| RelayError::transport(AbciMethod::Commit, e))
    }

    fn query(&mut self, req: RequestQuery) -> Result<ResponseQuery, RelayError> {
        Self::query(self, req).map_err(|e| RelayError::transport(AbciMethod::Query, e))
    }

    fn init_chain(&mut self, req: RequestInitChain) -> Result<ResponseInitChain, RelayError> {
        Self::init_chain(self, req).map_err(|e| RelayError::transport(AbciMethod::InitChain, e))
    }

    fn begin_block(&mut self, req: RequestBeginBlock) -> Result<ResponseBeginBlock, RelayError> {
        Self::begin_block(self, req).map_err(|e| RelayError::transport(AbciMethod::BeginBlock, e))
    }

    fn end_block(&mut self, req: RequestEndBlock) -> Result<ResponseEndBlock, RelayError> {
        Self::end_block(self, req).map_err(|e| RelayError::transport(AbciMethod::EndBlock, e))
    }

    // The socket client sends an empty request; there is nothing to carry over.
    fn list_snapshots(
        &mut self,
        _req: RequestListSnapshots,
    ) -> Result<ResponseListSnapshots, RelayError> {
        Self::list_snapshots(self)
            .map_err(|e| RelayError::transport(AbciMethod::ListSnapshots, e))
    }

    fn offer_snapshot(
        &mut self,
        req: RequestOfferSnapshot,
    ) -> Result<ResponseOfferSnapshot, RelayError> {
        Self::offer_snapshot(self, req)
            .map_err(|e| RelayError::transport(AbciMethod::OfferSnapshot, e))
    }

    fn load_snapshot_chunk(
        &mut self,
        req: RequestLoadSnapshotChunk,
    ) -> Result<ResponseLoadSnapshotChunk, RelayError> {
        Self::load_snapshot_chunk(self, req)
            .map_err(|e| RelayError::transport(AbciMethod::LoadSnapshotChunk, e))
    }

    fn apply_snapshot_chunk(
        &mut self,
        req: RequestApplySnapshotChunk,
    ) -> Result<ResponseApplySnapshotChunk, RelayError> {
        Self::apply_snapshot_chunk(self, req)
            .map_err(|e| RelayError::transport(AbciMethod::ApplySnapshotChunk, e))
    }
}
