//! Socket transport used by subscriptions and user streams.
//!
//! [`Transport`] and [`Connection`] are the seams the session core talks to;
//! [`WsTransport`] is the tokio-tungstenite implementation. Each connection
//! runs in its own task, forwards text frames to a handler, and reconnects
//! with exponential backoff after the socket drops or fails to connect. A
//! close through the handle ends the task.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use url::Url;

use crate::error::StreamError;
use crate::ws::client::WsConfig;

/// Close code sent by close handles.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close reason sent by close handles.
pub const CLOSE_REASON: &str = "Close handle was called";

/// Options forwarded to every connection closed by a close handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOptions {
    /// Do not reconnect after closing. Forwarded as-is; [`WsTransport`]
    /// treats every close through its handle as final.
    pub keep_closed: bool,
    /// Drop the socket without a close handshake.
    pub fast_close: bool,
}

impl Default for CloseOptions {
    fn default() -> Self {
        Self {
            keep_closed: true,
            fast_close: false,
        }
    }
}

impl CloseOptions {
    /// Set whether the connection stays closed.
    pub fn keep_closed(mut self, keep_closed: bool) -> Self {
        self.keep_closed = keep_closed;
        self
    }

    /// Set whether to skip the close handshake.
    pub fn fast_close(mut self, fast_close: bool) -> Self {
        self.fast_close = fast_close;
        self
    }
}

/// Event reported by a connection to its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame.
    Message(String),
    /// The socket dropped, or failed to connect, without being closed
    /// through its handle.
    Disconnected { reason: String },
    /// The socket came back after a drop.
    Reconnected,
}

/// Callback receiving every event of one connection.
pub type TransportHandler = Arc<dyn Fn(TransportEvent) + Send + Sync>;

/// Opens socket connections.
pub trait Transport: Send + Sync {
    /// Open a connection to `url`, delivering its events to `handler`.
    ///
    /// Connecting happens in the background; failures after this returns
    /// are reported as [`TransportEvent::Disconnected`].
    fn open(&self, url: &str, handler: TransportHandler)
    -> Result<Box<dyn Connection>, StreamError>;
}

/// An open socket connection.
pub trait Connection: Send + Sync {
    /// URL the connection was opened with.
    fn url(&self) -> &str;

    /// Close the connection.
    fn close(&self, code: u16, reason: &str, options: &CloseOptions) -> Result<(), StreamError>;
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Debug, Clone, Default)]
pub struct WsTransport {
    config: WsConfig,
}

impl WsTransport {
    /// Create a transport with the given reconnect settings.
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }
}

impl Transport for WsTransport {
    fn open(
        &self,
        url: &str,
        handler: TransportHandler,
    ) -> Result<Box<dyn Connection>, StreamError> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(StreamError::WebSocketMsg(format!(
                "Unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        let runtime = Handle::try_current()
            .map_err(|e| StreamError::WebSocketMsg(format!("No tokio runtime available: {}", e)))?;

        let (control, requests) = mpsc::unbounded_channel();
        runtime.spawn(run_socket(
            url.to_string(),
            self.config.clone(),
            handler,
            requests,
        ));

        Ok(Box::new(WsConnection {
            url: url.to_string(),
            control,
        }))
    }
}

#[derive(Debug)]
struct CloseRequest {
    code: u16,
    reason: String,
    options: CloseOptions,
}

/// Handle to a socket task spawned by [`WsTransport`].
#[derive(Debug)]
struct WsConnection {
    url: String,
    control: mpsc::UnboundedSender<CloseRequest>,
}

impl Connection for WsConnection {
    fn url(&self) -> &str {
        &self.url
    }

    fn close(&self, code: u16, reason: &str, options: &CloseOptions) -> Result<(), StreamError> {
        self.control
            .send(CloseRequest {
                code,
                reason: reason.to_string(),
                options: *options,
            })
            .map_err(|_| StreamError::ConnectionClosed {
                reason: format!("socket task for {} has stopped", self.url),
            })
    }
}

enum Outcome {
    Closed,
    Dropped(String),
}

async fn run_socket(
    url: String,
    config: WsConfig,
    handler: TransportHandler,
    mut requests: mpsc::UnboundedReceiver<CloseRequest>,
) {
    let mut attempt: u32 = 0;
    let mut connected_before = false;

    loop {
        let connected = tokio::select! {
            result = connect_async(url.as_str()) => result,
            _ = requests.recv() => return,
        };

        let socket = match connected {
            Ok((socket, _)) => socket,
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", url, e);
                handler(TransportEvent::Disconnected {
                    reason: format!("connect failed: {}", e),
                });
                if !wait_before_retry(&config, &mut attempt, &mut requests).await {
                    return;
                }
                continue;
            }
        };

        attempt = 0;
        if connected_before {
            tracing::info!("Reconnected to {}", url);
            handler(TransportEvent::Reconnected);
        }
        connected_before = true;

        let (mut sink, mut stream) = socket.split();

        let outcome = loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        handler(TransportEvent::Message(text.as_str().to_string()));
                    }
                    Some(Ok(WsMessage::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => handler(TransportEvent::Message(text.to_string())),
                        Err(e) => tracing::debug!("Dropping non UTF-8 binary frame: {}", e),
                    },
                    Some(Ok(WsMessage::Close(frame))) => {
                        let reason = match frame {
                            Some(frame) => format!(
                                "closed by server ({}): {}",
                                u16::from(frame.code),
                                frame.reason.as_str()
                            ),
                            None => "closed by server".to_string(),
                        };
                        break Outcome::Dropped(reason);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Outcome::Dropped(e.to_string()),
                    None => break Outcome::Dropped("stream ended".to_string()),
                },
                request = requests.recv() => match request {
                    Some(request) => {
                        if !request.options.fast_close {
                            let frame = CloseFrame {
                                code: CloseCode::from(request.code),
                                reason: request.reason.into(),
                            };
                            if let Err(e) = sink.send(WsMessage::Close(Some(frame))).await {
                                tracing::debug!("Failed to send close frame to {}: {}", url, e);
                            }
                        }
                        break Outcome::Closed;
                    }
                    None => break Outcome::Closed,
                },
            }
        };

        match outcome {
            Outcome::Closed => return,
            Outcome::Dropped(reason) => {
                tracing::warn!("Connection to {} dropped: {}", url, reason);
                handler(TransportEvent::Disconnected { reason });
                if !wait_before_retry(&config, &mut attempt, &mut requests).await {
                    return;
                }
            }
        }
    }
}

/// Sleep for the next backoff step. Returns `false` when the socket should
/// stay down: attempts exhausted, or closed while waiting.
async fn wait_before_retry(
    config: &WsConfig,
    attempt: &mut u32,
    requests: &mut mpsc::UnboundedReceiver<CloseRequest>,
) -> bool {
    if let Some(max) = config.max_reconnect_attempts {
        if *attempt >= max {
            tracing::warn!("Giving up after {} reconnect attempts", max);
            return false;
        }
    }

    let delay = config.backoff_duration(*attempt);
    *attempt += 1;

    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = requests.recv() => false,
    }
}
