//! Load test driver: one task per client, bounded by time or count.

use std::time::{Duration, Instant};

use tokio::{task::JoinSet, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    broadcast::TxBroadcaster,
    client::{ClientError, ClientFactory, TxClient},
    config::{ConfigError, LoadTestConfig},
};

/// Totals of a finished load test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadTestReport {
    /// Transactions accepted by the node.
    pub sent: u64,
    /// Transactions the node answered with a non-zero code.
    pub rejected: u64,
    /// Broadcasts that failed.
    pub failed: u64,
    /// Wall clock time of the run.
    pub elapsed: Duration,
}

impl LoadTestReport {
    /// Every transaction that was attempted.
    pub const fn total(&self) -> u64 {
        self.sent + self.rejected + self.failed
    }

    /// Average attempted transactions per second.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.total() as f64 / secs
        }
    }

    fn merge(&mut self, other: Self) {
        self.sent += other.sent;
        self.rejected += other.rejected;
        self.failed += other.failed;
    }
}

/// A prepared load test: validated configuration and one client per connection.
#[derive(Debug)]
pub struct LoadTest<C> {
    config: LoadTestConfig,
    clients: Vec<C>,
}

impl<C: TxClient> LoadTest<C> {
    /// Validates `config` and creates every client.
    ///
    /// The first client that fails to set up aborts preparation.
    pub fn prepare<F>(factory: &F, config: LoadTestConfig) -> Result<Self, LoadTestError>
    where
        F: ClientFactory<Client = C>,
    {
        config.validate()?;
        factory.validate_config(&config)?;

        let clients = (0..config.connections)
            .map(|idx| {
                debug!(connection = idx, "Creating load test client");
                factory.new_client(&config)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { config, clients })
    }

    /// The validated configuration.
    pub const fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    /// Runs every client until the deadline or its transaction count.
    ///
    /// A transaction generation error fails the whole run.
    pub async fn run(self, broadcaster: TxBroadcaster) -> Result<LoadTestReport, LoadTestError> {
        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.duration;
        info!(
            connections = self.config.connections,
            rate = self.config.rate,
            duration = ?self.config.duration,
            "Starting load test"
        );

        let mut tasks = JoinSet::new();
        for (idx, client) in self.clients.into_iter().enumerate() {
            let broadcaster = broadcaster.clone();
            let interval = self.config.send_interval();
            let count = self.config.count;
            tasks.spawn(async move {
                drive(idx, client, broadcaster, interval, count, deadline).await
            });
        }

        let mut report = LoadTestReport::default();
        let mut failure = None;
        while let Some(res) = tasks.join_next().await {
            match res {
                Ok(Ok(part)) => report.merge(part),
                Ok(Err(err)) => {
                    tasks.abort_all();
                    failure.get_or_insert(err);
                }
                Err(err) if err.is_cancelled() => {}
                Err(err) => {
                    tasks.abort_all();
                    failure.get_or_insert(LoadTestError::Worker(err.to_string()));
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        report.elapsed = start.elapsed();
        info!(
            sent = report.sent,
            rejected = report.rejected,
            failed = report.failed,
            rate = report.rate(),
            "Load test finished"
        );
        Ok(report)
    }
}

async fn drive<C: TxClient>(
    idx: usize,
    mut client: C,
    broadcaster: TxBroadcaster,
    interval: Duration,
    count: Option<u64>,
    deadline: tokio::time::Instant,
) -> Result<LoadTestReport, LoadTestError> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut report = LoadTestReport::default();

    while count.map_or(true, |count| report.total() < count) {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::time::sleep_until(deadline) => break,
        }

        let tx = client.generate_tx()?;
        match broadcaster.broadcast(tx).await {
            Ok(receipt) if receipt.is_ok() => report.sent += 1,
            Ok(receipt) => {
                debug!(connection = idx, code = receipt.code, log = %receipt.log, "Transaction rejected");
                report.rejected += 1;
            }
            Err(err) => {
                warn!(connection = idx, %err, "Broadcast failed");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Errors that can occur while preparing or running a load test
#[derive(Debug, thiserror::Error)]
pub enum LoadTestError {
    /// The configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A client could not be created or failed to generate a transaction
    #[error(transparent)]
    Client(#[from] ClientError),
    /// A worker task panicked
    #[error("load test worker failed: {0}")]
    Worker(String),
}
