//! Call labels and Rollkit ABCI extension messages.

use std::fmt;

use tendermint_proto::abci::{RequestBeginBlock, RequestDeliverTx, RequestEndBlock};

/// ABCI call kinds forwarded by the relayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbciMethod {
    /// `Info`
    Info,
    /// `CheckTx`
    CheckTx,
    /// `DeliverTx`
    DeliverTx,
    /// `Commit`
    Commit,
    /// `Query`
    Query,
    /// `InitChain`
    InitChain,
    /// `BeginBlock`
    BeginBlock,
    /// `EndBlock`
    EndBlock,
    /// `ListSnapshots`
    ListSnapshots,
    /// `OfferSnapshot`
    OfferSnapshot,
    /// `LoadSnapshotChunk`
    LoadSnapshotChunk,
    /// `ApplySnapshotChunk`
    ApplySnapshotChunk,
}

impl AbciMethod {
    /// Stable name used in logs, errors and metric labels.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::CheckTx => "check_tx",
            Self::DeliverTx => "deliver_tx",
            Self::Commit => "commit",
            Self::Query => "query",
            Self::InitChain => "init_chain",
            Self::BeginBlock => "begin_block",
            Self::EndBlock => "end_block",
            Self::ListSnapshots => "list_snapshots",
            Self::OfferSnapshot => "offer_snapshot",
            Self::LoadSnapshotChunk => "load_snapshot_chunk",
            Self::ApplySnapshotChunk => "apply_snapshot_chunk",
        }
    }
}

impl fmt::Display for AbciMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Rollkit extends the ABCI contract with fraud proof and app hash calls that
// `tendermint-proto` does not model.

/// Witness of a single store touched by a fraudulent state transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateWitness {
    /// Proof of the store root within the app hash.
    pub proof: Vec<u8>,
    /// Root hash of the store.
    pub root_hash: Vec<u8>,
    /// Witnessed key/value pairs with their proofs.
    pub witness_data: Vec<WitnessData>,
}

/// A single witnessed key/value pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WitnessData {
    /// Store key.
    pub key: Vec<u8>,
    /// Store value.
    pub value: Vec<u8>,
    /// Inclusion proof.
    pub proof: Vec<u8>,
}

/// Proof that a block contains an invalid state transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FraudProof {
    /// Height of the fraudulent block.
    pub block_height: i64,
    /// App hash before the fraudulent transition.
    pub pre_state_app_hash: Vec<u8>,
    /// App hash an honest execution produces.
    pub expected_valid_app_hash: Vec<u8>,
    /// Witnesses keyed by store name.
    pub state_witness: Vec<(String, StateWitness)>,
    /// The begin block request, if the fraud happened there.
    pub fraudulent_begin_block: Option<RequestBeginBlock>,
    /// The deliver tx request, if the fraud happened there.
    pub fraudulent_deliver_tx: Option<RequestDeliverTx>,
    /// The end block request, if the fraud happened there.
    pub fraudulent_end_block: Option<RequestEndBlock>,
}

/// Asks the application to generate a fraud proof for a block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestGenerateFraudProof {
    /// Begin block request of the disputed block.
    pub begin_block_request: Option<RequestBeginBlock>,
    /// Deliver tx requests of the disputed block.
    pub deliver_tx_requests: Vec<RequestDeliverTx>,
    /// End block request of the disputed block.
    pub end_block_request: Option<RequestEndBlock>,
}

/// Reply to [`RequestGenerateFraudProof`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseGenerateFraudProof {
    /// The generated proof, if any.
    pub fraud_proof: Option<FraudProof>,
}

/// Asks the application to verify a fraud proof.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestVerifyFraudProof {
    /// The proof to verify.
    pub fraud_proof: Option<FraudProof>,
    /// App hash an honest execution is expected to produce.
    pub expected_valid_app_hash: Vec<u8>,
}

/// Reply to [`RequestVerifyFraudProof`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseVerifyFraudProof {
    /// Whether the proof was verified.
    pub success: bool,
}

/// Asks the application for its current app hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestGetAppHash;

/// Reply to [`RequestGetAppHash`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseGetAppHash {
    /// Current app hash.
    pub app_hash: Vec<u8>,
}
