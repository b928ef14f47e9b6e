//! ABCI relayer
//!
//! This crate provides the relay between a rollup node and an ABCI application
//! running in a separate process:
//! - [`AbciConnection`], the seam to the downstream application
//! - [`AbciRelayer`], forwarding every call and returning typed transport errors
//! - [`RelayApplication`], the `tendermint_abci::Application` served to the node
//! - Rollkit ABCI extension types the relay answers locally

pub mod application;
pub mod connection;
pub mod error;
pub mod relayer;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export public types
pub use application::{abort_on_failure, FailureHandler, FraudProofApplication, RelayApplication};
pub use connection::{connect, AbciConnection};
pub use error::RelayError;
pub use relayer::AbciRelayer;
pub use types::AbciMethod;
