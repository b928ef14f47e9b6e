//! Address normalization.
//!
//! Tendermint configuration expresses listen addresses as `tcp://host:port`.
//! The blocking ABCI socket client and server want a plain `host:port`, while
//! the rollup p2p layer wants libp2p multiaddrs.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Errors produced while normalizing an address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The scheme is not supported by the socket transport.
    #[error("unsupported address scheme `{0}`")]
    UnsupportedScheme(String),
    /// The address has no `host:port` form.
    #[error("address `{0}` is not of the form host:port")]
    MissingPort(String),
    /// The port is not a valid TCP port.
    #[error("invalid port in address `{0}`")]
    InvalidPort(String),
    /// A seed entry is not of the form `id@host:port`.
    #[error("invalid seed `{0}`, expected id@host:port")]
    InvalidSeed(String),
}

/// Normalizes `tcp://host:port` (or a bare `host:port`) into `host:port`.
pub fn socket_address(addr: &str) -> Result<String, AddressError> {
    let rest = match addr.split_once("://") {
        Some(("tcp", rest)) => rest,
        Some((scheme, _)) => return Err(AddressError::UnsupportedScheme(scheme.to_string())),
        None => addr,
    };
    split_host_port(rest)?;
    Ok(rest.to_string())
}

/// Translates a `tcp://host:port` address into a libp2p multiaddr.
pub fn to_multiaddr(addr: &str) -> Result<String, AddressError> {
    let rest = socket_address(addr)?;
    let (host, port) = split_host_port(&rest)?;
    let proto = if host.parse::<Ipv4Addr>().is_ok() {
        "ip4"
    } else if host.parse::<Ipv6Addr>().is_ok() {
        "ip6"
    } else {
        "dns"
    };
    Ok(format!("/{proto}/{host}/tcp/{port}"))
}

/// Translates a comma separated list of `id@host:port` seeds into multiaddrs.
pub fn seeds_to_multiaddrs(seeds: &str) -> Result<Vec<String>, AddressError> {
    seeds
        .split(',')
        .map(str::trim)
        .filter(|seed| !seed.is_empty())
        .map(|seed| {
            let (id, addr) = seed
                .split_once('@')
                .ok_or_else(|| AddressError::InvalidSeed(seed.to_string()))?;
            if id.is_empty() {
                return Err(AddressError::InvalidSeed(seed.to_string()));
            }
            Ok(format!("{}/p2p/{id}", to_multiaddr(addr)?))
        })
        .collect()
}

fn split_host_port(addr: &str) -> Result<(&str, u16), AddressError> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| AddressError::MissingPort(addr.to_string()))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| AddressError::InvalidPort(addr.to_string()))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(AddressError::MissingPort(addr.to_string()));
    }
    Ok((host, port))
}
