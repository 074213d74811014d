//! Example: Streaming market data from several Binance streams.
//!
//! Opens trades and partial book depth for two spot symbols plus the
//! futures mark price feed, prints what arrives for 30 seconds, then closes
//! everything.
//!
//! Run with: cargo run --example market_streams

use std::time::Duration;

use binance_stream_client::types::{DepthTarget, KlineInterval, Market};
use binance_stream_client::ws::{BinanceWsClient, CloseOptions, StreamEvent};
use tracing_subscriber::EnvFilter;

fn print_event(event: StreamEvent) {
    match event {
        StreamEvent::Trade(trade) => {
            println!("[Trade] {} {} @ {}", trade.symbol, trade.quantity, trade.price);
        }
        StreamEvent::PartialDepth(book) => {
            let best_bid = book.bids.first().map(|level| level.price);
            let best_ask = book.asks.first().map(|level| level.price);
            println!(
                "[Depth{}] {} bid={:?} ask={:?}",
                book.level, book.symbol, best_bid, best_ask
            );
        }
        StreamEvent::Candle(candle) => {
            println!(
                "[Candle {}] {} o={} c={} final={}",
                candle.interval, candle.symbol, candle.open, candle.close, candle.is_final
            );
        }
        StreamEvent::MarkPrices(prices) => {
            println!("[Mark prices] {} symbols", prices.len());
        }
        other => println!("[Other] {:?}", other),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = BinanceWsClient::new();

    let trades = client.trades(Market::Spot, ["BTCUSDT", "ETHUSDT"], print_event)?;
    let books = client.partial_depth(
        Market::Spot,
        [DepthTarget::new("BTCUSDT", 5), DepthTarget::new("ETHUSDT", 5)],
        print_event,
    )?;
    let candles = client.candles(Market::Futures, "BTCUSDT", KlineInterval::OneMinute, print_event)?;
    let marks = client.all_mark_prices(print_event)?;

    println!("Streaming for 30 seconds...\n");
    tokio::time::sleep(Duration::from_secs(30)).await;

    for subscription in [&trades, &books, &candles, &marks] {
        subscription.close(CloseOptions::default());
    }
    println!("\nClosed all streams.");

    Ok(())
}
