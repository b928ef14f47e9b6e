//! Tendermint validator and node key files.

use std::{fmt, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{genesis::int_or_string, NodeError};

/// Amino type tag of Ed25519 private keys.
pub const ED25519_PRIV_KEY_TYPE: &str = "tendermint/PrivKeyEd25519";

/// Length of an Ed25519 private key in Tendermint's encoding (seed || public key).
pub const ED25519_PRIV_KEY_LEN: usize = 64;

/// An Ed25519 private key in Tendermint's 64 byte encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct Ed25519Secret([u8; ED25519_PRIV_KEY_LEN]);

impl Ed25519Secret {
    /// The raw 64 key bytes.
    pub const fn as_bytes(&self) -> &[u8; ED25519_PRIV_KEY_LEN] {
        &self.0
    }

    /// The public half of the key.
    pub fn public_key(&self) -> &[u8] {
        &self.0[32..]
    }

    fn decode(key: &KeyJson) -> Result<Self, String> {
        if key.key_type != ED25519_PRIV_KEY_TYPE {
            return Err(format!("unsupported key type `{}`", key.key_type));
        }
        let bytes = STANDARD.decode(&key.value).map_err(|err| err.to_string())?;
        let bytes: [u8; ED25519_PRIV_KEY_LEN] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            format!("expected {ED25519_PRIV_KEY_LEN} key bytes, got {}", bytes.len())
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Ed25519Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ed25519Secret(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct KeyJson {
    #[serde(rename = "type")]
    key_type: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PrivValidatorKeyJson {
    #[serde(default)]
    address: String,
    priv_key: KeyJson,
}

#[derive(Debug, Deserialize)]
struct NodeKeyJson {
    priv_key: KeyJson,
}

/// Last height, round and step the validator signed at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LastSignState {
    /// Block height.
    #[serde(deserialize_with = "int_or_string")]
    pub height: i64,
    /// Consensus round.
    #[serde(default)]
    pub round: i32,
    /// Consensus step.
    #[serde(default)]
    pub step: i8,
}

/// The block signing key of the node and its last sign state.
#[derive(Debug, Clone)]
pub struct PrivValidator {
    /// Validator address, hex encoded.
    pub address: String,
    /// Signing key.
    pub key: Ed25519Secret,
    /// Last sign state.
    pub last_sign_state: LastSignState,
}

impl PrivValidator {
    /// Loads the key and state files.
    pub fn load(key_file: &Path, state_file: &Path) -> Result<Self, NodeError> {
        let key: PrivValidatorKeyJson = read_json(key_file)?;
        let last_sign_state = read_json(state_file)?;
        let secret = Ed25519Secret::decode(&key.priv_key)
            .map_err(|reason| NodeError::InvalidKey { path: key_file.to_path_buf(), reason })?;
        Ok(Self { address: key.address, key: secret, last_sign_state })
    }
}

/// The p2p identity key of the node.
#[derive(Debug, Clone)]
pub struct NodeKey {
    /// Private key.
    pub priv_key: Ed25519Secret,
}

impl NodeKey {
    /// Loads the node key file.
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        let key: NodeKeyJson = read_json(path)?;
        let priv_key = Ed25519Secret::decode(&key.priv_key)
            .map_err(|reason| NodeError::InvalidKey { path: path.to_path_buf(), reason })?;
        Ok(Self { priv_key })
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, NodeError> {
    let raw = std::fs::read(path)
        .map_err(|source| NodeError::ReadFile { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&raw)
        .map_err(|source| NodeError::ParseFile { path: path.to_path_buf(), source })
}
