//! Self-renewing user data stream session.
//!
//! A [`UserStream`] acquires a listen key, opens `<base>/<listenKey>`, and
//! renews the key on a fixed interval. A failed renewal or a dropped socket
//! tears the session down (connection closed, key released) and reconnects
//! after a fixed delay, retrying for as long as the session is open.
//!
//! ```text
//! Idle -> Acquiring -> Active <-> Renewing
//!            ^           |          |
//!            |           v          v
//!            +------ Reconnecting <-+        any state -> Closed
//! ```
//!
//! All state lives in one [`SessionCore`] behind a mutex. Network calls run
//! in spawned tasks and report back through transition methods that ignore
//! completions issued under an older epoch.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::StreamError;
use crate::rest::ListenKeyService;
use crate::ws::client::WsConfig;
use crate::ws::messages::{self, UserEvent};
use crate::ws::subscription::ManagedConnection;
use crate::ws::transport::{CloseOptions, Transport, TransportEvent, TransportHandler};

/// Callback receiving the normalized events of a user stream.
pub type UserEventHandler = Arc<dyn Fn(UserEvent) + Send + Sync>;

/// Lifecycle state of a [`UserStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Not started, or the first acquisition failed.
    Idle,
    /// Waiting for a listen key.
    Acquiring,
    /// Connected with a valid listen key.
    Active,
    /// Connected, renewal in flight.
    Renewing,
    /// Torn down, waiting to acquire a new key.
    Reconnecting,
    /// Closed through the handle. Terminal.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Acquiring => "acquiring",
            SessionState::Active => "active",
            SessionState::Renewing => "renewing",
            SessionState::Reconnecting => "reconnecting",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Whether an acquisition failure is reported to the caller or retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Reconnect,
}

/// Mutable session state.
struct SessionCore {
    state: SessionState,
    listen_key: Option<String>,
    connection: Option<ManagedConnection>,
    keepalive: Option<AbortHandle>,
    retry: Option<AbortHandle>,
    /// Bumped on every teardown; completions carrying an older value are stale.
    epoch: u64,
}

/// Resources taken out of the core, released outside the lock.
struct Teardown {
    listen_key: Option<String>,
    connection: Option<ManagedConnection>,
}

impl SessionCore {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            listen_key: None,
            connection: None,
            keepalive: None,
            retry: None,
            epoch: 0,
        }
    }

    fn is_current(&self, epoch: u64, state: SessionState) -> bool {
        self.epoch == epoch && self.state == state
    }

    fn detach(&mut self) -> Teardown {
        if let Some(handle) = self.keepalive.take() {
            handle.abort();
        }
        if let Some(handle) = self.retry.take() {
            handle.abort();
        }
        self.epoch += 1;

        Teardown {
            listen_key: self.listen_key.take(),
            connection: self.connection.take(),
        }
    }
}

impl Drop for SessionCore {
    fn drop(&mut self) {
        if let Some(handle) = self.keepalive.take() {
            handle.abort();
        }
        if let Some(handle) = self.retry.take() {
            handle.abort();
        }
    }
}

struct Shared<S> {
    service: Arc<S>,
    transport: Arc<dyn Transport>,
    base_url: String,
    config: WsConfig,
    on_event: UserEventHandler,
    runtime: Handle,
    core: Mutex<SessionCore>,
}

/// A user data stream that keeps its listen key alive and reconnects on
/// failure.
///
/// Usually created through
/// [`BinanceWsClient::user_stream`](crate::ws::BinanceWsClient::user_stream),
/// which also starts it. Dropping the handle stops the timers and the socket
/// but leaves the listen key to expire; call [`UserStream::close`] to release
/// it.
pub struct UserStream<S: ListenKeyService> {
    shared: Arc<Shared<S>>,
}

impl<S: ListenKeyService> UserStream<S> {
    /// Create an idle session.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new<F>(
        service: Arc<S>,
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        config: WsConfig,
        on_event: F,
    ) -> Self
    where
        F: Fn(UserEvent) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                service,
                transport,
                base_url: base_url.into(),
                config,
                on_event: Arc::new(on_event),
                runtime: Handle::current(),
                core: Mutex::new(SessionCore::new()),
            }),
        }
    }

    /// Acquire a listen key and open the stream.
    ///
    /// Fails if the listen key cannot be acquired or the connection cannot be
    /// opened; the session is then idle again and may be restarted. Later
    /// failures are handled by reconnecting and never reach the caller.
    ///
    /// Dropping the returned future before it completes also leaves the
    /// session idle.
    pub async fn start(&self) -> Result<(), StreamError> {
        let epoch = {
            let mut core = self.shared.core.lock();
            if core.state != SessionState::Idle {
                return Err(StreamError::InvalidState(format!(
                    "cannot start a session that is {}",
                    core.state
                )));
            }
            core.state = SessionState::Acquiring;
            core.epoch
        };

        let _pending = PendingStart {
            shared: &self.shared,
            epoch,
        };
        self.shared.acquire(epoch, Attempt::First).await
    }

    /// Close the session.
    ///
    /// Cancels the renewal and reconnect timers, releases the listen key in
    /// the background (failures ignored) and closes the connection with
    /// `options`. Calling this again does nothing.
    pub fn close(&self, options: CloseOptions) {
        let teardown = {
            let mut core = self.shared.core.lock();
            if core.state == SessionState::Closed {
                return;
            }
            let teardown = core.detach();
            core.state = SessionState::Closed;
            teardown
        };

        tracing::info!("Closing user stream");
        self.shared.finish_teardown(teardown, &options);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.core.lock().state
    }

    /// Get the service managing listen keys.
    pub fn service(&self) -> &Arc<S> {
        &self.shared.service
    }
}

/// Returns a session left in `Acquiring` by an abandoned `start()` to `Idle`.
struct PendingStart<'a, S: ListenKeyService> {
    shared: &'a Shared<S>,
    epoch: u64,
}

impl<S: ListenKeyService> Drop for PendingStart<'_, S> {
    fn drop(&mut self) {
        let mut core = self.shared.core.lock();
        if core.is_current(self.epoch, SessionState::Acquiring) {
            tracing::debug!("Start was cancelled before a listen key arrived");
            core.state = SessionState::Idle;
        }
    }
}

impl<S: ListenKeyService> fmt::Debug for UserStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.core.lock();
        f.debug_struct("UserStream")
            .field("base_url", &self.shared.base_url)
            .field("state", &core.state)
            .field("has_listen_key", &core.listen_key.is_some())
            .finish()
    }
}

impl<S: ListenKeyService> Shared<S> {
    async fn acquire(self: &Arc<Self>, epoch: u64, attempt: Attempt) -> Result<(), StreamError> {
        match self.service.acquire().await {
            Ok(listen_key) => self.activate(epoch, listen_key, attempt),
            Err(e) => self.acquisition_failed(epoch, attempt, e),
        }
    }

    fn activate(
        self: &Arc<Self>,
        epoch: u64,
        listen_key: String,
        attempt: Attempt,
    ) -> Result<(), StreamError> {
        if !self.core.lock().is_current(epoch, SessionState::Acquiring) {
            return self.abandon(listen_key, None, attempt);
        }

        let opened = ManagedConnection::open(
            self.transport.as_ref(),
            &self.base_url,
            listen_key.clone(),
            self.frame_handler(epoch),
        );
        let connection = match opened {
            Ok(connection) => connection,
            Err(e) => {
                self.release_in_background(listen_key);
                return self.acquisition_failed(epoch, attempt, e);
            }
        };

        {
            let mut core = self.core.lock();
            if !core.is_current(epoch, SessionState::Acquiring) {
                drop(core);
                return self.abandon(listen_key, Some(connection), attempt);
            }
            core.state = SessionState::Active;
            core.listen_key = Some(listen_key);
            core.connection = Some(connection);
            core.keepalive = Some(self.spawn_keepalive(epoch));
        }

        tracing::info!("User stream active");

        if self.config.verify_on_connect {
            self.renew(epoch);
        }
        Ok(())
    }

    /// Drop resources acquired for a session that closed in the meantime.
    fn abandon(
        &self,
        listen_key: String,
        connection: Option<ManagedConnection>,
        attempt: Attempt,
    ) -> Result<(), StreamError> {
        tracing::debug!("Session changed during acquisition, releasing listen key");
        self.finish_teardown(
            Teardown {
                listen_key: Some(listen_key),
                connection,
            },
            &CloseOptions::default(),
        );

        match attempt {
            Attempt::First => Err(StreamError::InvalidState(
                "session was closed while starting".to_string(),
            )),
            Attempt::Reconnect => Ok(()),
        }
    }

    fn acquisition_failed(
        self: &Arc<Self>,
        epoch: u64,
        attempt: Attempt,
        error: StreamError,
    ) -> Result<(), StreamError> {
        let mut core = self.core.lock();
        let current = core.is_current(epoch, SessionState::Acquiring);

        match attempt {
            Attempt::First => {
                if current {
                    core.state = SessionState::Idle;
                }
                Err(error)
            }
            Attempt::Reconnect => {
                if current {
                    tracing::warn!(
                        "Failed to acquire listen key, retrying in {:?}: {}",
                        self.config.reconnect_delay,
                        error
                    );
                    self.schedule_reconnect(&mut core);
                } else {
                    tracing::debug!("Ignoring stale acquisition failure: {}", error);
                }
                Ok(())
            }
        }
    }

    /// Enter `Reconnecting` and arm the single reconnect timer.
    fn schedule_reconnect(self: &Arc<Self>, core: &mut SessionCore) {
        core.state = SessionState::Reconnecting;

        let epoch = core.epoch;
        let delay = self.config.reconnect_delay;
        let weak = Arc::downgrade(self);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.begin_reconnect(epoch);
            }
        });

        if let Some(previous) = core.retry.replace(task.abort_handle()) {
            previous.abort();
        }
    }

    fn begin_reconnect(self: &Arc<Self>, epoch: u64) {
        {
            let mut core = self.core.lock();
            if !core.is_current(epoch, SessionState::Reconnecting) {
                return;
            }
            core.state = SessionState::Acquiring;
            core.retry = None;
        }

        tracing::info!("Reconnecting user stream");
        let shared = Arc::clone(self);
        self.runtime.spawn(async move {
            // Reconnect failures are retried internally.
            let _ = shared.acquire(epoch, Attempt::Reconnect).await;
        });
    }

    fn spawn_keepalive(self: &Arc<Self>, epoch: u64) -> AbortHandle {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.config.keepalive_interval;

        self.runtime
            .spawn(async move {
                let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticks.tick().await;
                    match weak.upgrade() {
                        Some(shared) => shared.renew(epoch),
                        None => break,
                    }
                }
            })
            .abort_handle()
    }

    /// Issue one renewal if the session is active. Ticks arriving while a
    /// renewal or reconnect is in progress are dropped.
    fn renew(self: &Arc<Self>, epoch: u64) {
        let listen_key = {
            let mut core = self.core.lock();
            if !core.is_current(epoch, SessionState::Active) {
                tracing::debug!("Skipping renewal while {}", core.state);
                return;
            }
            let Some(listen_key) = core.listen_key.clone() else {
                return;
            };
            core.state = SessionState::Renewing;
            listen_key
        };

        let shared = Arc::clone(self);
        self.runtime.spawn(async move {
            if !shared.is_epoch(epoch) {
                return;
            }
            let result = shared.service.renew(&listen_key).await;
            shared.renewal_finished(epoch, result);
        });
    }

    fn renewal_finished(self: &Arc<Self>, epoch: u64, result: Result<(), StreamError>) {
        {
            let mut core = self.core.lock();
            if !core.is_current(epoch, SessionState::Renewing) {
                tracing::debug!("Ignoring stale renewal result");
                return;
            }
            if result.is_ok() {
                core.state = SessionState::Active;
                tracing::debug!("Listen key renewed");
                return;
            }
        }

        if let Err(e) = result {
            self.restart(epoch, &format!("listen key renewal failed: {}", e));
        }
    }

    /// Tear down the live connection and schedule a reconnect.
    fn restart(self: &Arc<Self>, epoch: u64, reason: &str) {
        let teardown = {
            let mut core = self.core.lock();
            let live = matches!(core.state, SessionState::Active | SessionState::Renewing);
            if core.epoch != epoch || !live {
                return;
            }
            let teardown = core.detach();
            self.schedule_reconnect(&mut core);
            teardown
        };

        tracing::warn!(
            "Reconnecting user stream in {:?}: {}",
            self.config.reconnect_delay,
            reason
        );
        self.finish_teardown(teardown, &CloseOptions::default());
    }

    fn finish_teardown(&self, teardown: Teardown, options: &CloseOptions) {
        if let Some(listen_key) = teardown.listen_key {
            self.release_in_background(listen_key);
        }
        if let Some(connection) = teardown.connection {
            connection.close(options);
        }
    }

    fn release_in_background(&self, listen_key: String) {
        let service = Arc::clone(&self.service);
        self.runtime.spawn(async move {
            if let Err(e) = service.release(&listen_key).await {
                tracing::debug!("Ignoring listen key release failure: {}", e);
            }
        });
    }

    fn is_epoch(&self, epoch: u64) -> bool {
        self.core.lock().epoch == epoch
    }

    fn frame_handler(self: &Arc<Self>, epoch: u64) -> TransportHandler {
        let weak = Arc::downgrade(self);
        Arc::new(move |event| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match event {
                TransportEvent::Message(text) => {
                    if !shared.is_epoch(epoch) {
                        return;
                    }
                    match messages::decode_user(&text) {
                        Ok(event) => (shared.on_event)(event),
                        Err(e) => tracing::warn!("Failed to decode user stream message: {}", e),
                    }
                }
                TransportEvent::Disconnected { reason } => {
                    shared.restart(epoch, &format!("socket disconnected: {}", reason));
                }
                TransportEvent::Reconnected => {
                    tracing::debug!("User stream socket reconnected");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::Reconnecting.to_string(), "reconnecting");
        assert_eq!(SessionState::Closed.to_string(), "closed");
    }

    #[test]
    fn test_detach_bumps_epoch_and_clears_key() {
        let mut core = SessionCore::new();
        core.state = SessionState::Active;
        core.listen_key = Some("key".to_string());

        let teardown = core.detach();
        assert_eq!(teardown.listen_key.as_deref(), Some("key"));
        assert!(teardown.connection.is_none());
        assert!(core.listen_key.is_none());
        assert_eq!(core.epoch, 1);
        assert!(!core.is_current(0, SessionState::Active));
    }
}
