//! WebSocket client: stream catalog and configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::CredentialsProvider;
use crate::error::StreamError;
use crate::rest::{ListenKeyClient, ListenKeyService};
use crate::types::{DepthTarget, KlineInterval, Market, UserStreamKind};
use crate::ws::messages::{StreamEvent, UserEvent};
use crate::ws::streams::{IntoTargets, StreamKind};
use crate::ws::subscription::Subscription;
use crate::ws::transport::{Transport, WsTransport};
use crate::ws::user_stream::UserStream;

/// WebSocket endpoint URLs.
pub mod endpoints {
    /// Spot market streams.
    pub const WS_SPOT: &str = "wss://stream.binance.com:9443/ws";
    /// USD-M futures market streams.
    pub const WS_FUTURES: &str = "wss://fstream.binance.com/ws";
}

/// Configuration for WebSocket connections and user stream sessions.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Initial backoff duration for socket reconnection.
    pub initial_backoff: Duration,
    /// Maximum backoff duration for socket reconnection.
    pub max_backoff: Duration,
    /// Maximum number of socket reconnection attempts (None = infinite).
    pub max_reconnect_attempts: Option<u32>,
    /// Interval between listen key renewals.
    pub keepalive_interval: Duration,
    /// Delay before a user stream reconnects after a failure.
    pub reconnect_delay: Duration,
    /// Renew the listen key once right after a user stream connects.
    pub verify_on_connect: bool,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            max_reconnect_attempts: None, // Infinite
            keepalive_interval: Duration::from_secs(50),
            reconnect_delay: Duration::from_secs(30),
            verify_on_connect: true,
        }
    }
}

impl WsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> WsConfigBuilder {
        WsConfigBuilder::new()
    }

    /// Backoff before socket reconnect attempt `attempt` (zero-based).
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_millis() as u64;
        let max = self.max_backoff.as_millis() as u64;
        let multiplier = 2u64.saturating_pow(attempt);
        let backoff_ms = base.saturating_mul(multiplier).min(max);
        Duration::from_millis(backoff_ms)
    }
}

/// Builder for [`WsConfig`].
#[derive(Debug, Clone, Default)]
pub struct WsConfigBuilder {
    config: WsConfig,
}

impl WsConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: WsConfig::default(),
        }
    }

    /// Set the socket reconnection backoff parameters.
    pub fn reconnect_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set maximum socket reconnection attempts.
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Set the listen key renewal interval.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.config.keepalive_interval = interval;
        self
    }

    /// Set the user stream reconnect delay.
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    /// Set whether a fresh listen key is renewed right after connecting.
    pub fn verify_on_connect(mut self, verify: bool) -> Self {
        self.config.verify_on_connect = verify;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> WsConfig {
        self.config
    }
}

/// Binance WebSocket client.
///
/// Every stream method opens one connection per target and returns a
/// [`Subscription`] that closes all of them at once.
///
/// # Example
///
/// ```rust,no_run
/// use binance_stream_client::ws::{BinanceWsClient, CloseOptions, StreamEvent};
/// use binance_stream_client::types::{DepthTarget, Market};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = BinanceWsClient::new();
/// let books = client.partial_depth(
///     Market::Spot,
///     [DepthTarget::new("BTCUSDT", 5), DepthTarget::new("ETHUSDT", 10)],
///     |event| {
///         if let StreamEvent::PartialDepth(book) = event {
///             println!("{}: {} bids", book.symbol, book.bids.len());
///         }
///     },
/// )?;
///
/// books.close(CloseOptions::default());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BinanceWsClient {
    /// Spot WebSocket URL.
    spot_url: String,
    /// Futures WebSocket URL.
    futures_url: String,
    /// Connection configuration.
    config: WsConfig,
    /// Socket transport.
    transport: Arc<dyn Transport>,
}

impl BinanceWsClient {
    /// Create a new WebSocket client with default settings.
    pub fn new() -> Self {
        Self::with_config(WsConfig::default())
    }

    /// Create a new WebSocket client with custom configuration.
    pub fn with_config(config: WsConfig) -> Self {
        Self {
            spot_url: endpoints::WS_SPOT.to_string(),
            futures_url: endpoints::WS_FUTURES.to_string(),
            transport: Arc::new(WsTransport::new(config.clone())),
            config,
        }
    }

    /// Create a client with custom URLs (useful for testing).
    pub fn with_urls(spot_url: impl Into<String>, futures_url: impl Into<String>) -> Self {
        Self {
            spot_url: spot_url.into(),
            futures_url: futures_url.into(),
            ..Self::new()
        }
    }

    /// Replace the socket transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Get the spot WebSocket URL.
    pub fn spot_url(&self) -> &str {
        &self.spot_url
    }

    /// Get the futures WebSocket URL.
    pub fn futures_url(&self) -> &str {
        &self.futures_url
    }

    /// Get the configuration.
    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// WebSocket base URL serving `market`.
    pub fn base_url(&self, market: Market) -> &str {
        match market {
            Market::Spot => &self.spot_url,
            Market::Futures => &self.futures_url,
        }
    }

    /// Subscribe to arbitrary streams on one market.
    pub fn subscribe<F>(
        &self,
        market: Market,
        streams: Vec<StreamKind>,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        Subscription::open(
            self.transport.as_ref(),
            self.base_url(market),
            streams,
            Arc::new(on_event),
        )
    }

    fn per_symbol<F>(
        &self,
        market: Market,
        symbols: impl IntoTargets<String>,
        kind: impl Fn(String) -> StreamKind,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        let streams = symbols.into_targets().into_iter().map(kind).collect();
        self.subscribe(market, streams, on_event)
    }

    /// Diff book depth updates.
    pub fn depth<F>(
        &self,
        market: Market,
        symbols: impl IntoTargets<String>,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.per_symbol(market, symbols, |symbol| StreamKind::Depth { symbol }, on_event)
    }

    /// Partial book depth snapshots, one per symbol and level.
    pub fn partial_depth<F>(
        &self,
        market: Market,
        targets: impl IntoTargets<DepthTarget>,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        let streams = targets
            .into_targets()
            .into_iter()
            .map(StreamKind::PartialDepth)
            .collect();
        self.subscribe(market, streams, on_event)
    }

    /// Candlestick updates.
    pub fn candles<F>(
        &self,
        market: Market,
        symbols: impl IntoTargets<String>,
        interval: KlineInterval,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.per_symbol(
            market,
            symbols,
            |symbol| StreamKind::Candles { symbol, interval },
            on_event,
        )
    }

    /// Raw trades.
    pub fn trades<F>(
        &self,
        market: Market,
        symbols: impl IntoTargets<String>,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.per_symbol(market, symbols, |symbol| StreamKind::Trades { symbol }, on_event)
    }

    /// Aggregate trades.
    pub fn agg_trades<F>(
        &self,
        market: Market,
        symbols: impl IntoTargets<String>,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.per_symbol(market, symbols, |symbol| StreamKind::AggTrades { symbol }, on_event)
    }

    /// Rolling 24h tickers.
    pub fn ticker<F>(
        &self,
        market: Market,
        symbols: impl IntoTargets<String>,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.per_symbol(market, symbols, |symbol| StreamKind::Ticker { symbol }, on_event)
    }

    /// Every symbol's 24h ticker, delivered as one [`StreamEvent::Tickers`]
    /// per frame.
    pub fn all_tickers<F>(&self, market: Market, on_event: F) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.subscribe(market, vec![StreamKind::AllTickers], on_event)
    }

    /// Best bid/ask updates.
    pub fn book_ticker<F>(
        &self,
        market: Market,
        symbols: impl IntoTargets<String>,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.per_symbol(market, symbols, |symbol| StreamKind::BookTicker { symbol }, on_event)
    }

    /// Futures mark price, once per second.
    pub fn mark_price<F>(
        &self,
        symbols: impl IntoTargets<String>,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.per_symbol(
            Market::Futures,
            symbols,
            |symbol| StreamKind::MarkPrice { symbol },
            on_event,
        )
    }

    /// Every futures symbol's mark price, delivered as one
    /// [`StreamEvent::MarkPrices`] per frame.
    pub fn all_mark_prices<F>(&self, on_event: F) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.subscribe(Market::Futures, vec![StreamKind::AllMarkPrices], on_event)
    }

    /// Futures liquidation orders.
    pub fn force_order<F>(
        &self,
        symbols: impl IntoTargets<String>,
        on_event: F,
    ) -> Result<Subscription, StreamError>
    where
        F: Fn(StreamEvent) + Send + Sync + 'static,
    {
        self.per_symbol(
            Market::Futures,
            symbols,
            |symbol| StreamKind::ForceOrder { symbol },
            on_event,
        )
    }

    /// Start a user data stream whose listen keys come from `service`.
    ///
    /// Returns once the first listen key is acquired and the connection is
    /// opened; a failure at that point is returned and nothing stays open.
    pub async fn user_stream<S, F>(
        &self,
        service: Arc<S>,
        market: Market,
        on_event: F,
    ) -> Result<UserStream<S>, StreamError>
    where
        S: ListenKeyService,
        F: Fn(UserEvent) + Send + Sync + 'static,
    {
        let stream = UserStream::new(
            service,
            Arc::clone(&self.transport),
            self.base_url(market),
            self.config.clone(),
            on_event,
        );
        stream.start().await?;
        Ok(stream)
    }

    /// Start a spot, margin or futures user data stream backed by the
    /// Binance REST API.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use binance_stream_client::auth::EnvCredentials;
    /// use binance_stream_client::types::UserStreamKind;
    /// use binance_stream_client::ws::{BinanceWsClient, CloseOptions};
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = BinanceWsClient::new();
    /// let account = client
    ///     .user_stream_for(UserStreamKind::Spot, Arc::new(EnvCredentials::from_env()), |event| {
    ///         println!("{:?}", event.event_type());
    ///     })
    ///     .await?;
    ///
    /// account.close(CloseOptions::default());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn user_stream_for<F>(
        &self,
        kind: UserStreamKind,
        credentials: Arc<dyn CredentialsProvider>,
        on_event: F,
    ) -> Result<UserStream<ListenKeyClient>, StreamError>
    where
        F: Fn(UserEvent) + Send + Sync + 'static,
    {
        let service = ListenKeyClient::builder(kind).credentials(credentials).build();
        self.user_stream(Arc::new(service), kind.market(), on_event)
            .await
    }
}

impl Default for BinanceWsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BinanceWsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceWsClient")
            .field("spot_url", &self.spot_url)
            .field("futures_url", &self.futures_url)
            .field("config", &self.config)
            .finish()
    }
}
