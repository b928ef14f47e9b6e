//! Relayer tests against a real downstream ABCI socket.

use relay_abci::{AbciRelayer, RelayApplication, RelayError};
use relay_common::constants::DEFAULT_READ_BUF_SIZE;
use tendermint_abci::ClientBuilder;
use tendermint_proto::{
    abci::{
        RequestBeginBlock, RequestCheckTx, RequestDeliverTx, RequestEndBlock, RequestInfo,
        RequestInitChain, RequestListSnapshots, RequestOfferSnapshot, RequestQuery,
        ResponseBeginBlock, Snapshot,
    },
    types::Header,
};

use crate::common::{
    closed_addr, serve, RecordingApp, APP_HASH, APP_NAME, CHECK_TX_GAS, SNAPSHOT_HEIGHT,
};

fn begin_block_at(height: i64) -> RequestBeginBlock {
    RequestBeginBlock { header: Some(Header { height, ..Default::default() }), ..Default::default() }
}

fn panic_on_failure(err: RelayError) -> ! {
    panic!("relay failure: {err}")
}

#[test]
fn relays_calls_to_the_downstream_app() {
    let app = RecordingApp::default();
    let addr = serve(app.clone()).unwrap();
    let relayer = AbciRelayer::connect(&addr, DEFAULT_READ_BUF_SIZE).unwrap();

    let info = relayer.info(RequestInfo { version: "0.34.24".to_string(), ..Default::default() }).unwrap();
    assert_eq!(info.data, APP_NAME);
    assert_eq!(info.version, "0.34.24");

    let delivered = relayer.deliver_tx(RequestDeliverTx { tx: b"transfer".to_vec().into() }).unwrap();
    assert_eq!(&delivered.data[..], b"transfer");

    let query = relayer
        .query(RequestQuery { data: b"balance".to_vec().into(), height: 3, ..Default::default() })
        .unwrap();
    assert_eq!(&query.value[..], b"balance");
    assert_eq!(query.height, 3);

    assert_eq!(&relayer.commit().unwrap().data[..], &APP_HASH[..]);
    assert_eq!(app.calls(), vec!["info", "deliver_tx", "query", "commit"]);
    assert_eq!(app.txs(), vec![b"transfer".to_vec()]);
}

#[test]
fn relays_block_and_snapshot_calls() {
    let app = RecordingApp::default();
    let addr = serve(app.clone()).unwrap();
    let relayer = AbciRelayer::connect(&addr, DEFAULT_READ_BUF_SIZE).unwrap();

    let checked =
        relayer.check_tx(RequestCheckTx { tx: b"mint".to_vec().into(), ..Default::default() }).unwrap();
    assert_eq!(&checked.data[..], b"mint");
    assert_eq!(checked.gas_wanted, CHECK_TX_GAS);

    let init = relayer
        .init_chain(RequestInitChain { chain_id: "rollup-1".to_string(), ..Default::default() })
        .unwrap();
    assert_eq!(&init.app_hash[..], &APP_HASH[..]);

    relayer.end_block(RequestEndBlock { height: 7 }).unwrap();

    let listed = relayer.list_snapshots(RequestListSnapshots::default()).unwrap();
    assert_eq!(listed.snapshots.len(), 1);
    assert_eq!(listed.snapshots[0].height, SNAPSHOT_HEIGHT);
    assert_eq!(listed.snapshots[0].chunks, 4);

    let offer = RequestOfferSnapshot {
        snapshot: Some(Snapshot { height: SNAPSHOT_HEIGHT, ..Default::default() }),
        ..Default::default()
    };
    assert_eq!(relayer.offer_snapshot(offer).unwrap().result, 1);

    assert_eq!(
        app.calls(),
        vec!["check_tx", "init_chain:rollup-1", "end_block:7", "list_snapshots", "offer_snapshot:100"]
    );
}

#[test]
fn first_begin_block_never_reaches_the_app() {
    let app = RecordingApp::default();
    let addr = serve(app.clone()).unwrap();
    let relayer = AbciRelayer::connect(&addr, DEFAULT_READ_BUF_SIZE).unwrap();

    assert_eq!(relayer.begin_block(begin_block_at(1)).unwrap(), ResponseBeginBlock::default());
    relayer.begin_block(begin_block_at(2)).unwrap();
    relayer.begin_block(RequestBeginBlock::default()).unwrap();

    assert_eq!(app.calls(), vec!["begin_block:2", "begin_block:0"]);
}

#[test]
fn connect_failure_is_reported() {
    let addr = closed_addr().unwrap();
    let err = AbciRelayer::connect(&addr, DEFAULT_READ_BUF_SIZE).unwrap_err();
    assert!(matches!(err, RelayError::Connect { address, .. } if address == addr));
}

#[test]
fn node_runtime_talks_through_the_relay() {
    let app = RecordingApp::default();
    let downstream = serve(app.clone()).unwrap();
    let relayer = AbciRelayer::connect(&downstream, DEFAULT_READ_BUF_SIZE).unwrap();
    let relay = serve(RelayApplication::with_failure_handler(relayer, panic_on_failure)).unwrap();

    // Stand-in for the node runtime's consensus connection.
    let mut node = ClientBuilder::new(DEFAULT_READ_BUF_SIZE).connect(&relay).unwrap();

    assert_eq!(node.info(RequestInfo::default()).unwrap().data, APP_NAME);
    node.begin_block(begin_block_at(1)).unwrap();
    node.deliver_tx(RequestDeliverTx { tx: b"tx-1".to_vec().into() }).unwrap();
    node.begin_block(begin_block_at(2)).unwrap();
    assert_eq!(&node.commit().unwrap().data[..], &APP_HASH[..]);

    assert_eq!(app.calls(), vec!["info", "deliver_tx", "begin_block:2", "commit"]);
}
