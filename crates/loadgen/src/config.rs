//! Load test parameters.

use std::time::Duration;

use relay_common::constants::DEFAULT_RPC_ENDPOINT;
use tokio::sync::Semaphore;

/// Load test parameters shared by the driver and the client factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTestConfig {
    /// Number of clients, one per connection.
    pub connections: usize,
    /// Transactions per second, per connection.
    pub rate: u32,
    /// How long to run.
    pub duration: Duration,
    /// Stop each connection after this many transactions.
    pub count: Option<u64>,
    /// Tendermint RPC endpoints.
    pub endpoints: Vec<reqwest::Url>,
    /// Maximum broadcasts in flight across all connections.
    pub max_in_flight: usize,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            connections: 1,
            rate: 1_000,
            duration: Duration::from_secs(60),
            count: None,
            endpoints: DEFAULT_RPC_ENDPOINT.parse().into_iter().collect(),
            max_in_flight: 256,
        }
    }
}

impl LoadTestConfig {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connections == 0 {
            return Err(ConfigError::InvalidConnections);
        }
        if self.rate == 0 {
            return Err(ConfigError::InvalidRate);
        }
        if self.duration.is_zero() {
            return Err(ConfigError::InvalidDuration);
        }
        if self.count == Some(0) {
            return Err(ConfigError::InvalidCount);
        }
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        if self.max_in_flight == 0 || self.max_in_flight > Semaphore::MAX_PERMITS {
            return Err(ConfigError::InvalidMaxInFlight);
        }
        Ok(())
    }

    /// Interval between two transactions of one connection, never zero.
    pub fn send_interval(&self) -> Duration {
        (Duration::from_secs(1) / self.rate.max(1)).max(Duration::from_nanos(1))
    }
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("At least one connection is required")]
    /// Zero connections.
    InvalidConnections,
    #[error("Invalid rate value")]
    /// Zero rate.
    InvalidRate,
    #[error("Invalid duration value")]
    /// Zero duration.
    InvalidDuration,
    #[error("Invalid count value")]
    /// A count limit of zero.
    InvalidCount,
    #[error("At least one endpoint is required")]
    /// No endpoints.
    NoEndpoints,
    #[error("Invalid max in-flight value")]
    /// Zero in-flight limit, or more than a semaphore can hold.
    InvalidMaxInFlight,
}
