//! Integration tests for the ABCI relay
//!
//! This crate contains tests that cross crate boundaries: the relayer over
//! real ABCI sockets, the rollup node over a full Tendermint home, and the
//! relay binary itself.

pub mod common;

#[cfg(test)]
mod binary_tests;
#[cfg(test)]
mod node_tests;
#[cfg(test)]
mod relay_tests;

// Re-export common test utilities
pub use common::*;
