/*
[INPUT]:  Local WebSocket price server scenarios
[OUTPUT]: Test results for the StandX provider session
[POS]:    Integration tests - WebSocket provider
[UPDATE]: When WebSocket provider changes
*/

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{CountingEvent, spawn_price_server, unused_ws_url, wait_for};
use rtd_stream_adapter::{
    RtdError, RtdServer, RtdValue, StandxRtdServer, StandxSettings, StandxWebSocket, Symbol, Topic,
    TopicArgs,
};
use tokio_test::{assert_err, assert_ok};

fn args(topic: &str, symbol: &str) -> TopicArgs {
    TopicArgs::new(Topic::new(topic), Symbol::new(symbol))
}

#[test]
fn test_websocket_receiver_take_once() {
    let mut ws = StandxWebSocket::new();
    assert!(ws.take_receiver().is_some());
    assert!(ws.take_receiver().is_none());
}

#[test]
fn test_provider_streams_subscribed_price() {
    let url = spawn_price_server("101.5");
    let mut server = StandxRtdServer::new(StandxSettings { ws_url: url });
    let event = Arc::new(CountingEvent::default());

    assert_ok!(server.server_start(event.clone()));
    let initial = assert_ok!(server.connect_data(1, &args("LAST", "BTC-USD"), true));
    assert!(initial.is_empty());

    assert!(wait_for(|| event.notified.load(Ordering::SeqCst) > 0));

    let batch = assert_ok!(server.refresh_data());
    let values: Vec<RtdValue> = batch.matching(1).map(|row| row.value.clone()).collect();
    assert_eq!(values, vec![RtdValue::Double(101.5)]);
    assert!(assert_ok!(server.heartbeat()));

    assert_ok!(server.disconnect_data(1));
    assert_ok!(server.server_terminate());
    assert_eq!(Arc::strong_count(&event), 1);
    assert_eq!(event.disconnected.load(Ordering::SeqCst), 1);
}

#[test]
fn test_provider_rejects_unknown_topic() {
    let url = spawn_price_server("1");
    let mut server = StandxRtdServer::new(StandxSettings { ws_url: url });
    assert_ok!(server.server_start(Arc::new(CountingEvent::default())));

    let err = assert_err!(server.connect_data(1, &args("VOLUME", "BTC-USD"), true));
    assert!(matches!(err, RtdError::UnknownTopic(_)));
    assert_ok!(server.server_terminate());
}

#[test]
fn test_provider_start_fails_without_endpoint() {
    let mut server = StandxRtdServer::new(StandxSettings {
        ws_url: unused_ws_url(),
    });
    let err = assert_err!(server.server_start(Arc::new(CountingEvent::default())));
    assert!(err.is_fatal());
}

#[test]
fn test_provider_start_rejects_malformed_url() {
    let mut server = StandxRtdServer::new(StandxSettings {
        ws_url: "not a url".to_string(),
    });
    let err = assert_err!(server.server_start(Arc::new(CountingEvent::default())));
    assert!(matches!(err, RtdError::UrlParse(_)));
}

#[test]
fn test_calls_before_start_are_rejected() {
    let mut server = StandxRtdServer::new(StandxSettings::default());
    assert!(matches!(server.refresh_data(), Err(RtdError::NotStarted)));
    assert!(matches!(server.heartbeat(), Err(RtdError::NotStarted)));
}
