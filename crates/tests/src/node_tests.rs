//! Node configuration and lifecycle tests over a full Tendermint home.

use clap::Parser;
use relay_abci::{test_utils::MockConnection, AbciMethod, AbciRelayer, RelayApplication, RelayError};
use relay_common::constants::DEFAULT_READ_BUF_SIZE;
use relay_node::{NodeConfig, RelayArgs, RollupNode};
use tendermint_abci::ClientBuilder;
use tendermint_proto::abci::RequestInfo;

use crate::common::{serve, RecordingApp, TendermintHome, APP_NAME, TEST_CHAIN_ID};

fn panic_on_failure(err: RelayError) -> ! {
    panic!("relay failure: {err}")
}

fn config_for(home: &TendermintHome, app_addr: &str) -> NodeConfig {
    let args = RelayArgs::try_parse_from([
        "abci-relay",
        "--config",
        home.config_file().to_str().unwrap(),
        "--address",
        &format!("tcp://{app_addr}"),
        "--listen",
        "tcp://127.0.0.1:0",
        "--rollkit.namespace_id=00000000000000ff",
    ])
    .unwrap();
    NodeConfig::from_args(&args).unwrap()
}

#[test]
fn loads_a_tendermint_home() {
    let home = TendermintHome::new().unwrap();
    let config = config_for(&home, "127.0.0.1:26658");

    assert_eq!(config.root_dir, home.root());
    assert_eq!(config.app_address, "127.0.0.1:26658");
    assert_eq!(config.tendermint.moniker, "integration");
    assert_eq!(config.rollkit.namespace_id.to_string(), "00000000000000ff");
    assert_eq!(config.rollkit.p2p.listen_address, "/ip4/0.0.0.0/tcp/26656");
    assert!(config.rollkit.p2p.seeds.is_empty());
}

#[test]
fn rollup_node_serves_the_relay() {
    let app = RecordingApp::default();
    let downstream = serve(app.clone()).unwrap();
    let home = TendermintHome::new().unwrap();
    let config = config_for(&home, &downstream);

    let relayer = AbciRelayer::connect(&config.app_address, config.read_buf_size).unwrap();
    let node = RollupNode::new(
        config,
        RelayApplication::with_failure_handler(relayer, panic_on_failure),
    )
    .unwrap();
    assert_eq!(node.genesis().chain_id, TEST_CHAIN_ID);

    let handle = node.start().unwrap();
    let mut client = ClientBuilder::new(DEFAULT_READ_BUF_SIZE).connect(handle.local_addr()).unwrap();

    assert_eq!(client.info(RequestInfo::default()).unwrap().data, APP_NAME);
    assert_eq!(app.calls(), vec!["info"]);
    assert!(!handle.is_finished());
}

#[test]
fn rollup_node_serves_any_connection() {
    let mock = MockConnection::default();
    let home = TendermintHome::new().unwrap();
    let config = config_for(&home, "127.0.0.1:26658");
    let app = RelayApplication::with_failure_handler(AbciRelayer::new(mock.clone()), panic_on_failure);

    let handle = RollupNode::new(config, app).unwrap().start().unwrap();
    let mut client = ClientBuilder::new(DEFAULT_READ_BUF_SIZE).connect(handle.local_addr()).unwrap();

    assert_eq!(client.commit().unwrap(), mock.responses().commit);
    assert_eq!(mock.calls(), vec![AbciMethod::Commit]);
}
