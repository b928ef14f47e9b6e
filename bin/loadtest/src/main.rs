//! Load generator for rollups served through the ABCI relay.
//!
//! Each connection takes one transaction template from an external program
//! and broadcasts copies carrying fresh UUIDs to the Tendermint RPC endpoints.

#![allow(missing_docs, rustdoc::missing_crate_level_docs)]

use std::{num::NonZeroU32, time::Duration};

use clap::Parser;
use eyre::{eyre, WrapErr};
use relay_common::constants::DEFAULT_RPC_ENDPOINT;
use relay_loadgen::{CommandTemplate, LoadTest, LoadTestConfig, TemplateClientFactory, TxBroadcaster};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_TEMPLATE_COMMAND: &str = "cargo run --release programs/fibonacci.json main --no-broadcast";

#[derive(Debug, Parser)]
#[command(name = "abci-loadtest", about = "Load testing client for rollup ABCI applications")]
struct Args {
    /// Number of connections, one client each
    #[arg(short = 'c', long, default_value_t = 1)]
    connections: usize,

    /// Transactions per second, per connection
    #[arg(short = 'r', long, default_value_t = 1_000)]
    rate: u32,

    /// Duration of the test, in seconds
    #[arg(short = 'T', long = "time", default_value_t = 60)]
    time: u64,

    /// Stop each connection after this many transactions
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Comma separated Tendermint RPC endpoints
    #[arg(long, value_delimiter = ',', default_value = DEFAULT_RPC_ENDPOINT)]
    endpoints: Vec<reqwest::Url>,

    /// Maximum broadcasts in flight across all connections
    #[arg(long = "max-in-flight", default_value_t = 256)]
    max_in_flight: usize,

    /// Command printing a transaction template to stdout, split on whitespace.
    /// Quotes are not interpreted; pass arguments containing spaces with `--template-arg`.
    #[arg(long = "template-cmd", env = "ABCI_LOADTEST_TEMPLATE_CMD", default_value = DEFAULT_TEMPLATE_COMMAND)]
    template_cmd: String,

    /// Extra argument appended verbatim to the template command, repeatable
    #[arg(long = "template-arg", allow_hyphen_values = true)]
    template_args: Vec<String>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> LoadTestConfig {
        LoadTestConfig {
            connections: self.connections,
            rate: self.rate,
            duration: Duration::from_secs(self.time),
            count: self.count,
            endpoints: self.endpoints.clone(),
            max_in_flight: self.max_in_flight,
        }
    }

    fn template(&self) -> eyre::Result<CommandTemplate> {
        let mut parts = self.template_cmd.split_whitespace();
        let program = parts.next().ok_or_else(|| eyre!("template command is empty"))?;
        Ok(CommandTemplate::new(program, parts.map(str::to_string).chain(self.template_args.iter().cloned())))
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();
}

async fn run(args: Args) -> eyre::Result<()> {
    let config = args.config();
    let factory = TemplateClientFactory::new(args.template()?);
    let test = LoadTest::prepare(&factory, config.clone()).wrap_err("failed to set up load test clients")?;

    let total_rate = u32::try_from(config.connections)
        .ok()
        .and_then(|connections| connections.checked_mul(config.rate))
        .and_then(NonZeroU32::new)
        .unwrap_or(NonZeroU32::MAX);
    let broadcaster = TxBroadcaster::new(config.endpoints.clone(), config.max_in_flight, total_rate, None)?;

    let report = test.run(broadcaster).await?;
    info!(
        sent = report.sent,
        rejected = report.rejected,
        failed = report.failed,
        elapsed = ?report.elapsed,
        rate = report.rate(),
        "Load test complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(args).await {
        error!("{err:?}");
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
