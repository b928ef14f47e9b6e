//! Server-side adapter exposing an [`AbciRelayer`] as an ABCI application.

use tendermint_abci::{Application, Client};
use tendermint_proto::abci::{
    RequestApplySnapshotChunk, RequestBeginBlock, RequestCheckTx, RequestDeliverTx,
    RequestEndBlock, RequestInfo, RequestInitChain, RequestListSnapshots,
    RequestLoadSnapshotChunk, RequestOfferSnapshot, RequestQuery, ResponseApplySnapshotChunk,
    ResponseBeginBlock, ResponseCheckTx, ResponseCommit, ResponseDeliverTx, ResponseEndBlock,
    ResponseInfo, ResponseInitChain, ResponseListSnapshots, ResponseLoadSnapshotChunk,
    ResponseOfferSnapshot, ResponseQuery,
};
use tracing::error;

use crate::{
    connection::AbciConnection,
    error::RelayError,
    relayer::AbciRelayer,
    types::{
        RequestGenerateFraudProof, RequestGetAppHash, RequestVerifyFraudProof,
        ResponseGenerateFraudProof, ResponseGetAppHash, ResponseVerifyFraudProof,
    },
};

/// Called when a forwarded call fails. Never returns.
pub type FailureHandler = fn(RelayError) -> !;

/// Logs the failure and aborts the process.
///
/// A node that cannot reach its application has no safe way to keep
/// producing blocks.
pub fn abort_on_failure(err: RelayError) -> ! {
    error!(%err, "ABCI relay failed, aborting");
    std::process::abort()
}

/// Rollkit's fraud proof extensions to the ABCI application contract.
pub trait FraudProofApplication {
    /// Generates a fraud proof for the disputed block.
    fn generate_fraud_proof(&self, req: RequestGenerateFraudProof) -> ResponseGenerateFraudProof;

    /// Verifies a fraud proof.
    fn verify_fraud_proof(&self, req: RequestVerifyFraudProof) -> ResponseVerifyFraudProof;

    /// Returns the current app hash.
    fn get_app_hash(&self, req: RequestGetAppHash) -> ResponseGetAppHash;
}

/// An ABCI application that answers every call through an [`AbciRelayer`].
///
/// The server-side trait has no error channel, so transport failures are
/// handed to a [`FailureHandler`].
pub struct RelayApplication<C = Client> {
    relayer: AbciRelayer<C>,
    on_failure: FailureHandler,
}

impl<C> Clone for RelayApplication<C> {
    fn clone(&self) -> Self {
        Self { relayer: self.relayer.clone(), on_failure: self.on_failure }
    }
}

impl<C> std::fmt::Debug for RelayApplication<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayApplication").field("relayer", &self.relayer).finish_non_exhaustive()
    }
}

impl<C: AbciConnection> RelayApplication<C> {
    /// Wraps `relayer`, aborting the process on the first transport failure.
    pub fn new(relayer: AbciRelayer<C>) -> Self {
        Self::with_failure_handler(relayer, abort_on_failure)
    }

    /// Wraps `relayer` with a custom failure handler.
    pub fn with_failure_handler(relayer: AbciRelayer<C>, on_failure: FailureHandler) -> Self {
        Self { relayer, on_failure }
    }

    /// The underlying relayer.
    pub const fn relayer(&self) -> &AbciRelayer<C> {
        &self.relayer
    }

    fn settle<T>(&self, res: Result<T, RelayError>) -> T {
        match res {
            Ok(res) => res,
            Err(err) => (self.on_failure)(err),
        }
    }
}

impl<C: AbciConnection> Application for RelayApplication<C> {
    fn info(&self, request: RequestInfo) -> ResponseInfo {
        self.settle(self.relayer.info(request))
    }

    fn init_chain(&self, request: RequestInitChain) -> ResponseInitChain {
        self.settle(self.relayer.init_chain(request))
    }

    fn query(&self, request: RequestQuery) -> ResponseQuery {
        self.settle(self.relayer.query(request))
    }

    fn check_tx(&self, request: RequestCheckTx) -> ResponseCheckTx {
        self.settle(self.relayer.check_tx(request))
    }

    fn begin_block(&self, request: RequestBeginBlock) -> ResponseBeginBlock {
        self.settle(self.relayer.begin_block(request))
    }

    fn deliver_tx(&self, request: RequestDeliverTx) -> ResponseDeliverTx {
        self.settle(self.relayer.deliver_tx(request))
    }

    fn end_block(&self, request: RequestEndBlock) -> ResponseEndBlock {
        self.settle(self.relayer.end_block(request))
    }

    fn commit(&self) -> ResponseCommit {
        self.settle(self.relayer.commit())
    }

    fn list_snapshots(&self) -> ResponseListSnapshots {
        self.settle(self.relayer.list_snapshots(RequestListSnapshots::default()))
    }

    fn offer_snapshot(&self, request: RequestOfferSnapshot) -> ResponseOfferSnapshot {
        self.settle(self.relayer.offer_snapshot(request))
    }

    fn load_snapshot_chunk(&self, request: RequestLoadSnapshotChunk) -> ResponseLoadSnapshotChunk {
        self.settle(self.relayer.load_snapshot_chunk(request))
    }

    fn apply_snapshot_chunk(
        &self,
        request: RequestApplySnapshotChunk,
    ) -> ResponseApplySnapshotChunk {
        self.settle(self.relayer.apply_snapshot_chunk(request))
    }
}

impl<C: AbciConnection> FraudProofApplication for RelayApplication<C> {
    fn generate_fraud_proof(&self, req: RequestGenerateFraudProof) -> ResponseGenerateFraudProof {
        self.relayer.generate_fraud_proof(req)
    }

    fn verify_fraud_proof(&self, req: RequestVerifyFraudProof) -> ResponseVerifyFraudProof {
        self.relayer.verify_fraud_proof(req)
    }

    fn get_app_hash(&self, req: RequestGetAppHash) -> ResponseGetAppHash {
        self.relayer.get_app_hash(req)
    }
}
