/*
[INPUT]:  Symbol change requests, including ones the provider rejects
[OUTPUT]: Reconnection behavior verification
[POS]:    Integration test layer - subscription replacement
[UPDATE]: When changing reconnect ordering or failure handling
*/

mod common;

use common::{Call, MockServer, harness, strip_timestamp};
use rtd_stream_adapter::{RefreshBatch, RefreshRow, Symbol};
use rtd_stream_client::{DispatchState, TOPIC_ID};

fn connects(server: &MockServer) -> Vec<(i32, String)> {
    server
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Connect { topic_id, symbol, .. } => Some((topic_id, symbol)),
            _ => None,
        })
        .collect()
}

#[test]
fn reconnect_replaces_subscription_under_same_topic_id() {
    let mut h = harness(MockServer::new(), "LAST", "AAPL");
    h.intent.request_symbol(Symbol::new("MSFT"));
    h.dispatcher.step().unwrap();

    assert_eq!(
        connects(&h.server),
        vec![(TOPIC_ID, "AAPL".to_string()), (TOPIC_ID, "MSFT".to_string())]
    );
    assert_eq!(h.server.count(|call| *call == Call::Disconnect(TOPIC_ID)), 1);

    let active = h.dispatcher.manager().active().unwrap();
    assert_eq!(active.symbol(), &Symbol::new("MSFT"));
    assert_eq!(active.topic_id(), TOPIC_ID);

    let output = h.out.contents();
    assert!(output.contains("Reconnecting with new symbol: MSFT"));
    assert!(output.contains("Connected to symbol: MSFT"));
    assert_eq!(h.dispatcher.stats().reconnects, 1);
}

#[test]
fn new_data_is_labelled_with_new_symbol() {
    let mut h = harness(MockServer::new(), "LAST", "AAPL");
    h.intent.request_symbol(Symbol::new("MSFT"));
    h.server.push_batch(RefreshBatch::new(vec![RefreshRow::new(TOPIC_ID, 411.0)]));
    h.server.notify();
    h.dispatcher.step().unwrap();

    let data: Vec<String> = h
        .out
        .lines()
        .iter()
        .filter_map(|line| strip_timestamp(line).map(str::to_string))
        .collect();
    assert_eq!(data, vec!["MSFT = 411.000000".to_string()]);
}

#[test]
fn rejected_symbol_leaves_no_active_subscription() {
    let mut h = harness(MockServer::rejecting(&["BADSYM"]), "LAST", "AAPL");
    h.intent.request_symbol(Symbol::new("BADSYM"));
    assert_eq!(h.dispatcher.step().unwrap(), DispatchState::Running);

    assert!(h.dispatcher.manager().active().is_none());
    assert!(h.out.contents().contains("Connection failed for symbol BADSYM"));
    assert_eq!(h.dispatcher.stats().reconnect_failures, 1);

    // Rows still arrive for the old id but nothing is subscribed.
    h.server.push_batch(RefreshBatch::new(vec![RefreshRow::new(TOPIC_ID, 1.0)]));
    h.server.notify();
    h.dispatcher.step().unwrap();
    assert_eq!(h.dispatcher.stats().rows_emitted, 0);

    h.intent.request_symbol(Symbol::new("GOOD"));
    h.dispatcher.step().unwrap();
    assert_eq!(
        h.dispatcher.manager().active().map(|sub| sub.symbol().clone()),
        Some(Symbol::new("GOOD"))
    );
}

#[test]
fn reconnect_request_is_consumed_once() {
    let mut h = harness(MockServer::new(), "LAST", "AAPL");
    h.intent.request_symbol(Symbol::new("TSLA"));
    for _ in 0..3 {
        h.dispatcher.step().unwrap();
    }
    assert_eq!(connects(&h.server).len(), 2);
    assert!(!h.intent.snapshot().reconnect_requested);
}
