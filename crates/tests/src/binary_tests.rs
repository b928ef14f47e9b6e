//! Tests running the relay binary through cargo.

use std::{
    process::{Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use relay_common::constants::DEFAULT_READ_BUF_SIZE;
use tendermint_abci::{Client, ClientBuilder};
use tendermint_proto::abci::RequestInfo;

use crate::common::{closed_addr, hangup_addr, TendermintHome};

/// Generous enough to cover building the binary on a cold cache.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(300);
const EXIT_TIMEOUT: Duration = Duration::from_secs(30);

fn relay(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--quiet", "-p", "abci-relay", "--bin", "abci-relay", "--"])
        .args(args)
        .output()
        .expect("Failed to execute cargo run")
}

/// Tests that the relay binary shows help without crashing
#[test]
fn test_relay_help() {
    let output = relay(&["--help"]);

    assert!(
        output.status.success(),
        "Help command failed:\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--config", "--address", "--rollkit.namespace_id", "--rollkit.da_config", "--listen"] {
        assert!(stdout.contains(flag), "help output is missing {flag}:\n{stdout}");
    }
}

/// Tests that an unreachable application makes the relay exit with status 1
#[test]
fn test_relay_exits_when_app_is_unreachable() {
    let home = TendermintHome::new().unwrap();
    let app = closed_addr().unwrap();
    let config = home.config_file();

    let output = relay(&[
        "--config",
        config.to_str().unwrap(),
        "--address",
        &format!("tcp://{app}"),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to connect to the ABCI application"), "stderr: {stderr}");
}

/// Tests that a bad namespace id is rejected before connecting
#[test]
fn test_relay_rejects_bad_namespace_id() {
    let home = TendermintHome::new().unwrap();
    let config = home.config_file();

    let output = relay(&["--config", config.to_str().unwrap(), "--rollkit.namespace_id", "xyz"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid namespace id"), "stderr: {stderr}");
}

/// Tests that a failing downstream call aborts the relay process
#[test]
fn test_relay_aborts_on_transport_failure() {
    let home = TendermintHome::new().unwrap();
    let config = home.config_file();
    let app = hangup_addr().unwrap();
    let listen = closed_addr().unwrap();

    let mut child = Command::new("cargo")
        .args(["run", "--quiet", "-p", "abci-relay", "--bin", "abci-relay", "--"])
        .args(["--config", config.to_str().unwrap()])
        .args(["--address", &format!("tcp://{app}")])
        .args(["--listen", &format!("tcp://{listen}")])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to execute cargo run");

    let started = Instant::now();
    let mut client: Client = loop {
        if let Ok(client) = ClientBuilder::new(DEFAULT_READ_BUF_SIZE).connect(&listen) {
            break client;
        }
        if let Some(status) = child.try_wait().unwrap() {
            panic!("relay exited before serving: {status}");
        }
        if started.elapsed() > STARTUP_TIMEOUT {
            let _ = child.kill();
            panic!("relay did not start serving on {listen}");
        }
        thread::sleep(Duration::from_millis(200));
    };

    assert!(client.info(RequestInfo::default()).is_err());

    let status = wait_with_timeout(&mut child, EXIT_TIMEOUT);
    assert!(!status.success(), "relay kept running after a failed call: {status}");
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(status.code(), None, "expected an abort, got {status}");
        assert!(status.signal().is_some());
    }
}

fn wait_with_timeout(child: &mut std::process::Child, timeout: Duration) -> ExitStatus {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if started.elapsed() > timeout {
            let _ = child.kill();
            panic!("relay did not exit within {timeout:?}");
        }
        thread::sleep(Duration::from_millis(50));
    }
}
