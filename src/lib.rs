//! # Binance Stream Client
//!
//! An async Rust client for the Binance WebSocket market streams and
//! user data streams.
//!
//! ## Features
//!
//! - One-call subscriptions that fan out to one socket per symbol, closed
//!   together through a single handle
//! - Canonical, descriptively named events for every stream type
//! - Self-renewing user data streams (spot, margin, futures) that reconnect
//!   on listen key expiry or socket loss
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use binance_stream_client::ws::{BinanceWsClient, CloseOptions, StreamEvent};
//! use binance_stream_client::types::Market;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BinanceWsClient::new();
//!     let trades = client.trades(Market::Spot, ["BTCUSDT", "ETHUSDT"], |event| {
//!         if let StreamEvent::Trade(trade) = event {
//!             println!("{} {} @ {}", trade.symbol, trade.quantity, trade.price);
//!         }
//!     })?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//!     trades.close(CloseOptions::default());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod rest;
pub mod types;
pub mod ws;

// Re-export commonly used types at crate root
pub use error::StreamError;
pub use types::common::{KlineInterval, Market};

/// Result type alias using StreamError
pub type Result<T> = std::result::Result<T, StreamError>;
