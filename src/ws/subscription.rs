//! One logical subscription fanned out to one connection per stream.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StreamError;
use crate::ws::messages::{self, StreamEvent};
use crate::ws::streams::StreamKind;
use crate::ws::transport::{
    CLOSE_REASON, CloseOptions, Connection, NORMAL_CLOSURE, Transport, TransportEvent,
    TransportHandler,
};

/// Callback receiving the normalized events of a subscription.
pub type EventHandler = Arc<dyn Fn(StreamEvent) + Send + Sync>;

/// A connection owned by exactly one subscription or user stream.
pub(crate) struct ManagedConnection {
    stream: String,
    connection: Box<dyn Connection>,
}

impl ManagedConnection {
    pub(crate) fn open(
        transport: &dyn Transport,
        base_url: &str,
        stream: String,
        handler: TransportHandler,
    ) -> Result<Self, StreamError> {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), stream);
        let connection = transport.open(&url, handler)?;
        Ok(Self { stream, connection })
    }

    pub(crate) fn stream(&self) -> &str {
        &self.stream
    }

    /// Close the connection, consuming it so it cannot be closed twice.
    pub(crate) fn close(self, options: &CloseOptions) {
        if let Err(e) = self
            .connection
            .close(NORMAL_CLOSURE, CLOSE_REASON, options)
        {
            tracing::warn!("Failed to close {}: {}", self.connection.url(), e);
        }
    }
}

impl std::fmt::Debug for ManagedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedConnection")
            .field("stream", &self.stream)
            .field("url", &self.connection.url())
            .finish()
    }
}

/// Aggregate close handle for every connection of one subscription request.
///
/// Dropping the handle stops the sockets without a close frame; call
/// [`Subscription::close`] for a clean shutdown.
pub struct Subscription {
    connections: Mutex<Vec<ManagedConnection>>,
}

impl Subscription {
    /// Open one connection per stream under `base_url`.
    ///
    /// If any connection fails to open, the ones already opened are closed
    /// and the error is returned.
    pub(crate) fn open(
        transport: &dyn Transport,
        base_url: &str,
        streams: Vec<StreamKind>,
        on_event: EventHandler,
    ) -> Result<Self, StreamError> {
        if streams.is_empty() {
            return Err(StreamError::NoTargets);
        }

        let mut connections = Vec::with_capacity(streams.len());
        for kind in streams {
            let stream = kind.path();
            let handler = frame_handler(kind, on_event.clone());
            match ManagedConnection::open(transport, base_url, stream, handler) {
                Ok(connection) => connections.push(connection),
                Err(e) => {
                    for connection in connections {
                        connection.close(&CloseOptions::default());
                    }
                    return Err(e);
                }
            }
        }

        tracing::debug!("Opened {} stream connection(s)", connections.len());

        Ok(Self {
            connections: Mutex::new(connections),
        })
    }

    /// Stream paths served by this subscription, empty once closed.
    pub fn streams(&self) -> Vec<String> {
        self.connections
            .lock()
            .iter()
            .map(|c| c.stream().to_string())
            .collect()
    }

    /// Whether [`Subscription::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.connections.lock().is_empty()
    }

    /// Close every connection with code 1000 and the given options.
    ///
    /// A failing close does not stop the others. Calling this again does
    /// nothing.
    pub fn close(&self, options: CloseOptions) {
        let connections = std::mem::take(&mut *self.connections.lock());
        for connection in connections {
            connection.close(&options);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("streams", &self.streams())
            .finish()
    }
}

fn frame_handler(kind: StreamKind, on_event: EventHandler) -> TransportHandler {
    Arc::new(move |event| match event {
        TransportEvent::Message(text) => match messages::decode(&kind, &text) {
            Ok(event) => on_event(event),
            Err(e) => tracing::warn!("Failed to decode {} message: {}", kind, e),
        },
        TransportEvent::Disconnected { reason } => {
            tracing::warn!("Stream {} disconnected: {}", kind, reason);
        }
        TransportEvent::Reconnected => tracing::info!("Stream {} reconnected", kind),
    })
}
