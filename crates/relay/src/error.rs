//! Relay errors.

use std::fmt::Display;

use crate::types::AbciMethod;

/// Errors surfaced by the relayer.
///
/// The relayer never recovers from these itself; the caller decides whether a
/// failure aborts the process or propagates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Opening the connection to the downstream application failed
    #[error("failed to connect to ABCI application at {address}: {reason}")]
    Connect {
        /// Address of the downstream application.
        address: String,
        /// Underlying error message.
        reason: String,
    },
    /// A forwarded call failed at the transport level
    #[error("ABCI {method} call failed: {reason}")]
    Transport {
        /// The call that failed.
        method: AbciMethod,
        /// Underlying error message.
        reason: String,
    },
}

impl RelayError {
    /// Builds a [`RelayError::Transport`] for `method`.
    pub fn transport(method: AbciMethod, err: impl Display) -> Self {
        Self::Transport { method, reason: err.to_string() }
    }

    /// Builds a [`RelayError::Connect`] for `address`.
    pub fn connect(address: impl Into<String>, err: impl Display) -> Self {
        Self::Connect { address: address.into(), reason: err.to_string() }
    }
}
