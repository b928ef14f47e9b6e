//! Genesis document.

use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::{keys::read_json, NodeError};

/// Maximum length of a chain id.
pub const MAX_CHAIN_ID_LEN: usize = 50;

/// The genesis document of the chain.
///
/// Only the fields the node checks are typed; everything else is kept as is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenesisDoc {
    /// Chain id.
    #[serde(default)]
    pub chain_id: String,
    /// First block height.
    #[serde(default = "default_initial_height", deserialize_with = "int_or_string")]
    pub initial_height: i64,
    /// Genesis time, RFC 3339.
    #[serde(default)]
    pub genesis_time: Option<String>,
    /// Application state handed to `InitChain`.
    #[serde(default)]
    pub app_state: Option<serde_json::Value>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

const fn default_initial_height() -> i64 {
    1
}

impl GenesisDoc {
    /// Reads and validates the genesis file.
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        let mut doc: Self = read_json(path)?;
        doc.validate_and_complete()
            .map_err(|reason| NodeError::InvalidGenesis { path: path.to_path_buf(), reason })?;
        Ok(doc)
    }

    fn validate_and_complete(&mut self) -> Result<(), String> {
        if self.chain_id.is_empty() {
            return Err("genesis doc must include non-empty chain_id".to_string());
        }
        if self.chain_id.len() > MAX_CHAIN_ID_LEN {
            return Err(format!("chain_id in genesis doc is too long (max: {MAX_CHAIN_ID_LEN})"));
        }
        if self.initial_height < 0 {
            return Err(format!("initial_height cannot be negative (got {})", self.initial_height));
        }
        if self.initial_height == 0 {
            self.initial_height = 1;
        }
        Ok(())
    }
}

/// Deserializes an `i64` that Tendermint may encode as a JSON string.
pub(crate) fn int_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(value) => Ok(value),
        IntOrString::Str(value) => value.parse().map_err(serde::de::Error::custom),
    }
}
