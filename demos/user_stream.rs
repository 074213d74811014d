//! Example: Self-renewing spot user data stream.
//!
//! Requires `BINANCE_API_KEY` (a `.env` file works too). The listen key is
//! renewed every 50 seconds and the stream reconnects on its own if renewal
//! fails.
//!
//! Run with: RUST_LOG=binance_stream_client=debug cargo run --example user_stream

use std::sync::Arc;
use std::time::Duration;

use binance_stream_client::auth::EnvCredentials;
use binance_stream_client::types::UserStreamKind;
use binance_stream_client::ws::{BinanceWsClient, CloseOptions, UserEvent};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let _ = dotenv::dotenv();

    let Some(credentials) = EnvCredentials::try_from_env() else {
        println!("Set BINANCE_API_KEY to run this example.");
        return Ok(());
    };

    let client = BinanceWsClient::new();
    let stream = client
        .user_stream_for(UserStreamKind::Spot, Arc::new(credentials), |event| match event {
            UserEvent::ExecutionReport(report) => println!(
                "[Order] {} {} {} {} @ {} ({})",
                report.symbol,
                report.side,
                report.order_type,
                report.quantity,
                report.price,
                report.order_status
            ),
            UserEvent::AccountPosition(position) => {
                for balance in position.balances {
                    println!("[Balance] {} free={} locked={}", balance.asset, balance.free, balance.locked);
                }
            }
            other => println!("[{}] {:?}", other.event_type().unwrap_or("unknown"), other),
        })
        .await?;

    println!("User stream is {}. Listening for 5 minutes...", stream.state());
    tokio::time::sleep(Duration::from_secs(300)).await;

    stream.close(CloseOptions::default());
    println!("User stream is {}.", stream.state());

    Ok(())
}
