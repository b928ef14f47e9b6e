//! Rollup node host that relays every ABCI call to an external application.
//!
//! The node runtime connects to `--listen`; each call it makes is forwarded
//! over one socket connection to the application at `--address`.

#![allow(missing_docs, rustdoc::missing_crate_level_docs)]

use clap::Parser;
use eyre::WrapErr;
use relay_abci::{AbciRelayer, RelayApplication};
use relay_node::{init_tracing, NodeConfig, NodeHandle, RelayArgs, RollupNode};
use tokio::signal;
use tracing::info;

/// Why the process stopped before serving.
#[derive(Debug)]
enum Failure {
    /// Configuration, connection or node construction failed.
    Setup(eyre::Report),
    /// The ABCI server could not start.
    Start(eyre::Report),
}

impl Failure {
    const fn exit_code(&self) -> i32 {
        match self {
            Self::Setup(_) => 1,
            Self::Start(_) => 2,
        }
    }

    const fn report(&self) -> &eyre::Report {
        match self {
            Self::Setup(report) | Self::Start(report) => report,
        }
    }
}

fn start(args: &RelayArgs) -> Result<NodeHandle, Failure> {
    let config = NodeConfig::from_args(args).wrap_err("invalid configuration").map_err(Failure::Setup)?;

    init_tracing(&config.tendermint.log_level).map_err(|err| Failure::Setup(err.into()))?;
    info!(da_layer = %config.rollkit.da_layer, da_config = %config.rollkit.da_config, "DA configuration");

    let relayer = AbciRelayer::connect(&config.app_address, config.read_buf_size)
        .wrap_err("failed to connect to the ABCI application")
        .map_err(Failure::Setup)?;
    info!(address = %config.app_address, "Connected to ABCI application");

    let node = RollupNode::new(config, RelayApplication::new(relayer))
        .wrap_err("failed to create rollup node")
        .map_err(Failure::Setup)?;
    node.start().wrap_err("failed to start rollup node").map_err(Failure::Start)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                    _ = signal::ctrl_c() => info!("Received SIGINT, shutting down"),
                }
                return;
            }
            Err(err) => {
                tracing::warn!(%err, "Failed to install SIGTERM handler, falling back to SIGINT only");
            }
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT, shutting down"),
        Err(err) => {
            tracing::error!(%err, "Failed to wait for SIGINT, running until the server exits");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() {
    let args = RelayArgs::parse();

    let handle = match start(&args) {
        Ok(handle) => handle,
        Err(failure) => {
            eprintln!("Error: {:?}", failure.report());
            std::process::exit(failure.exit_code());
        }
    };
    info!(listen = %handle.local_addr(), "Serving ABCI to the node runtime");

    let mut server = tokio::task::spawn_blocking(move || handle.wait());
    tokio::select! {
        res = &mut server => {
            match res {
                Ok(Ok(())) => info!("ABCI server exited"),
                Ok(Err(err)) => {
                    eprintln!("Error: {err}");
                    std::process::exit(1);
                }
                Err(err) => {
                    eprintln!("Error: ABCI server task failed: {err}");
                    std::process::exit(1);
                }
            }
        }
        () = shutdown_signal() => {}
    }
    std::process::exit(0);
}
