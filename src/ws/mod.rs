//! Binance WebSocket streams.
//!
//! - [`BinanceWsClient`] exposes one method per stream type. Each opens one
//!   connection per target and returns a [`Subscription`] closing all of them.
//! - [`UserStream`] manages a user data stream: listen key acquisition,
//!   periodic renewal and reconnection.
//! - [`messages`] holds the canonical event types and the pure normalizers.
//! - [`transport`] defines the socket seam and the tokio-tungstenite
//!   implementation.

mod client;
pub mod messages;
mod streams;
mod subscription;
pub mod transport;
mod user_stream;

pub use client::{BinanceWsClient, WsConfig, WsConfigBuilder, endpoints};
pub use messages::{StreamEvent, UserEvent};
pub use streams::{IntoTargets, StreamKind};
pub use subscription::{EventHandler, Subscription};
pub use transport::{CloseOptions, Connection, Transport, TransportEvent, TransportHandler, WsTransport};
pub use user_stream::{SessionState, UserEventHandler, UserStream};
