//! Shared constants and address helpers used across the relay workspace.

pub mod addr;
pub mod constants;

pub use addr::{seeds_to_multiaddrs, socket_address, to_multiaddr, AddressError};
