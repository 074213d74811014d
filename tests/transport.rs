use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use binance_stream_client::types::Market;
use binance_stream_client::ws::transport::{CLOSE_REASON, NORMAL_CLOSURE};
use binance_stream_client::ws::{
    BinanceWsClient, CloseOptions, Transport, TransportEvent, TransportHandler, WsConfig,
    WsTransport,
};

const WAIT: Duration = Duration::from_secs(5);

fn channel_handler() -> (TransportHandler, mpsc::UnboundedReceiver<TransportEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler: TransportHandler = Arc::new(move |event| {
        let _ = tx.send(event);
    });
    (handler, rx)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<TransportEvent>) -> TransportEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a transport event")
        .expect("handler dropped")
}

#[tokio::test]
async fn test_forwards_text_and_sends_close_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/btcusdt@trade", listener.local_addr().unwrap());
    let (handler, mut events) = channel_handler();

    let connection = WsTransport::default().open(&url, handler).unwrap();

    let (socket, _) = listener.accept().await.unwrap();
    let mut server = accept_async(socket).await.unwrap();
    server
        .send(Message::text(r#"{"e":"trade","s":"BTCUSDT"}"#))
        .await
        .unwrap();
    server
        .send(Message::binary(br#"{"e":"trade","s":"ETHUSDT"}"#.to_vec()))
        .await
        .unwrap();

    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Message(r#"{"e":"trade","s":"BTCUSDT"}"#.to_string())
    );
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Message(r#"{"e":"trade","s":"ETHUSDT"}"#.to_string())
    );

    connection
        .close(NORMAL_CLOSURE, CLOSE_REASON, &CloseOptions::default())
        .unwrap();

    let frame = timeout(WAIT, server.next()).await.unwrap().unwrap().unwrap();
    match frame {
        Message::Close(Some(frame)) => {
            assert_eq!(u16::from(frame.code), 1000);
            assert_eq!(frame.reason.as_str(), "Close handle was called");
        }
        other => panic!("expected a close frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reconnects_after_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/!ticker@arr", listener.local_addr().unwrap());
    let (handler, mut events) = channel_handler();
    let config = WsConfig::builder()
        .reconnect_backoff(Duration::from_millis(10), Duration::from_millis(50))
        .build();

    let connection = WsTransport::new(config).open(&url, handler).unwrap();

    let (socket, _) = listener.accept().await.unwrap();
    let server = accept_async(socket).await.unwrap();
    drop(server);

    assert!(matches!(
        next_event(&mut events).await,
        TransportEvent::Disconnected { .. }
    ));

    let (socket, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    let mut server = accept_async(socket).await.unwrap();
    assert_eq!(next_event(&mut events).await, TransportEvent::Reconnected);

    server.send(Message::text("[]")).await.unwrap();
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Message("[]".to_string())
    );

    connection
        .close(NORMAL_CLOSURE, CLOSE_REASON, &CloseOptions::default())
        .unwrap();
}

#[tokio::test]
async fn test_fast_close_skips_handshake() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/btcusdt@depth", listener.local_addr().unwrap());
    let (handler, _events) = channel_handler();

    let connection = WsTransport::default().open(&url, handler).unwrap();
    let (socket, _) = listener.accept().await.unwrap();
    let mut server = accept_async(socket).await.unwrap();

    connection
        .close(
            NORMAL_CLOSURE,
            CLOSE_REASON,
            &CloseOptions::default().fast_close(true),
        )
        .unwrap();

    let next = timeout(WAIT, server.next()).await.unwrap();
    assert!(!matches!(next, Some(Ok(Message::Close(_)))));
}

#[tokio::test]
async fn test_connect_failure_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/key-1", listener.local_addr().unwrap());
    drop(listener);

    let (handler, mut events) = channel_handler();
    let config = WsConfig::builder()
        .reconnect_backoff(Duration::from_millis(10), Duration::from_millis(50))
        .build();
    let connection = WsTransport::new(config).open(&url, handler).unwrap();

    // Reported on the first attempt and again on every retry.
    for _ in 0..2 {
        match next_event(&mut events).await {
            TransportEvent::Disconnected { reason } => assert!(reason.starts_with("connect failed")),
            other => panic!("expected a disconnect, got {:?}", other),
        }
    }

    connection
        .close(NORMAL_CLOSURE, CLOSE_REASON, &CloseOptions::default())
        .unwrap();
}

#[tokio::test]
async fn test_subscription_close_ends_socket_without_keep_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("ws://{}/ws", listener.local_addr().unwrap());
    let client = BinanceWsClient::with_urls(base.clone(), base);

    let trades = client.trades(Market::Spot, "BTCUSDT", |_| {}).unwrap();
    let (socket, _) = listener.accept().await.unwrap();
    let mut server = accept_async(socket).await.unwrap();

    trades.close(CloseOptions::default().keep_closed(false));

    let frame = timeout(WAIT, server.next()).await.unwrap().unwrap().unwrap();
    assert!(matches!(frame, Message::Close(Some(_))));
    assert!(
        timeout(Duration::from_millis(500), listener.accept())
            .await
            .is_err()
    );
    assert!(trades.is_closed());
}
