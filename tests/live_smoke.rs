use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use binance_stream_client::auth::EnvCredentials;
use binance_stream_client::rest::ListenKeyClient;
use binance_stream_client::types::{Market, UserStreamKind};
use binance_stream_client::ws::{BinanceWsClient, CloseOptions, SessionState, StreamEvent};

fn live_tests_enabled() -> bool {
    std::env::var("BINANCE_LIVE_TESTS").ok().as_deref() == Some("1")
}

#[tokio::test]
#[ignore]
async fn live_spot_trades_smoke() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    if !live_tests_enabled() {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = BinanceWsClient::new();
    let trades = client.trades(Market::Spot, ["BTCUSDT", "ETHUSDT"], move |event| {
        let _ = tx.send(event);
    })?;

    let event = tokio::time::timeout(Duration::from_secs(30), rx.recv()).await?;
    trades.close(CloseOptions::default());

    assert!(matches!(event, Some(StreamEvent::Trade(_))));
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_futures_mark_prices_smoke() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    if !live_tests_enabled() {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = BinanceWsClient::new();
    let prices = client.all_mark_prices(move |event| {
        let _ = tx.send(event);
    })?;

    let event = tokio::time::timeout(Duration::from_secs(30), rx.recv()).await?;
    prices.close(CloseOptions::default());

    match event {
        Some(StreamEvent::MarkPrices(prices)) => assert!(!prices.is_empty()),
        other => panic!("expected mark prices, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_spot_user_stream_smoke() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    if !live_tests_enabled() {
        return Ok(());
    }

    let credentials = match EnvCredentials::try_from_env() {
        Some(creds) => creds,
        None => return Ok(()),
    };
    let service = ListenKeyClient::builder(UserStreamKind::Spot)
        .credentials(Arc::new(credentials))
        .build();

    let client = BinanceWsClient::new();
    let stream = client
        .user_stream(Arc::new(service), Market::Spot, |_| {})
        .await?;

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(stream.state(), SessionState::Active);

    stream.close(CloseOptions::default());
    assert_eq!(stream.state(), SessionState::Closed);
    Ok(())
}
