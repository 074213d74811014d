#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use binance_stream_client::StreamError;
use binance_stream_client::error::ApiError;
use binance_stream_client::rest::ListenKeyService;
use binance_stream_client::ws::{
    CloseOptions, Connection, Transport, TransportEvent, TransportHandler,
};

pub const SPOT_BASE: &str = "wss://stream.test/ws";
pub const FUTURES_BASE: &str = "wss://fstream.test/ws";

/// One `close` call observed on a mock connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseCall {
    pub code: u16,
    pub reason: String,
    pub options: CloseOptions,
}

struct Opened {
    url: String,
    handler: TransportHandler,
    closes: Arc<Mutex<Vec<CloseCall>>>,
}

/// Transport that records every open and close instead of touching the network.
#[derive(Default)]
pub struct MockTransport {
    opened: Mutex<Vec<Opened>>,
    fail_at: Mutex<Option<usize>>,
    fail_close_at: Mutex<Option<usize>>,
    attempts: Mutex<usize>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the `index`-th open call (zero-based).
    pub fn fail_open_at(&self, index: usize) {
        *self.fail_at.lock() = Some(index);
    }

    /// Make `close` fail on the `index`-th opened connection (zero-based).
    /// The call is still recorded.
    pub fn fail_close_at(&self, index: usize) {
        *self.fail_close_at.lock() = Some(index);
    }

    pub fn urls(&self) -> Vec<String> {
        self.opened.lock().iter().map(|o| o.url.clone()).collect()
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn closes(&self, index: usize) -> Vec<CloseCall> {
        self.opened.lock()[index].closes.lock().clone()
    }

    pub fn total_closes(&self) -> usize {
        self.opened
            .lock()
            .iter()
            .map(|o| o.closes.lock().len())
            .sum()
    }

    /// Deliver an event to the handler of the `index`-th connection.
    pub fn emit(&self, index: usize, event: TransportEvent) {
        let handler = Arc::clone(&self.opened.lock()[index].handler);
        handler(event);
    }

    pub fn send_text(&self, index: usize, text: &str) {
        self.emit(index, TransportEvent::Message(text.to_string()));
    }
}

impl Transport for MockTransport {
    fn open(
        &self,
        url: &str,
        handler: TransportHandler,
    ) -> Result<Box<dyn Connection>, StreamError> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            let attempt = *attempts;
            *attempts += 1;
            attempt
        };
        if *self.fail_at.lock() == Some(attempt) {
            return Err(StreamError::WebSocketMsg(format!("refused {}", url)));
        }

        let closes = Arc::new(Mutex::new(Vec::new()));
        let mut opened = self.opened.lock();
        let fails = *self.fail_close_at.lock() == Some(opened.len());
        opened.push(Opened {
            url: url.to_string(),
            handler,
            closes: Arc::clone(&closes),
        });

        Ok(Box::new(MockConnection {
            url: url.to_string(),
            closes,
            fails,
        }))
    }
}

struct MockConnection {
    url: String,
    closes: Arc<Mutex<Vec<CloseCall>>>,
    fails: bool,
}

impl Connection for MockConnection {
    fn url(&self) -> &str {
        &self.url
    }

    fn close(&self, code: u16, reason: &str, options: &CloseOptions) -> Result<(), StreamError> {
        self.closes.lock().push(CloseCall {
            code,
            reason: reason.to_string(),
            options: *options,
        });
        if self.fails {
            return Err(StreamError::ConnectionClosed {
                reason: format!("{} already gone", self.url),
            });
        }
        Ok(())
    }
}

/// Listen key service answering from scripted outcomes.
///
/// Unscripted calls succeed; acquired keys are `key-1`, `key-2`, ...
#[derive(Default)]
pub struct MockListenKeys {
    acquire_script: Mutex<VecDeque<bool>>,
    renew_script: Mutex<VecDeque<bool>>,
    release_fails: Mutex<bool>,
    acquire_delay: Mutex<Duration>,
    renew_delay: Mutex<Duration>,
    acquire_calls: Mutex<usize>,
    renewed: Mutex<Vec<String>>,
    released: Mutex<Vec<String>>,
}

impl MockListenKeys {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_acquire(&self, outcomes: &[bool]) {
        self.acquire_script.lock().extend(outcomes.iter().copied());
    }

    pub fn script_renew(&self, outcomes: &[bool]) {
        self.renew_script.lock().extend(outcomes.iter().copied());
    }

    /// Hold every later `acquire` call for `delay` before answering.
    pub fn delay_acquire(&self, delay: Duration) {
        *self.acquire_delay.lock() = delay;
    }

    /// Hold every later `renew` call for `delay` before answering.
    pub fn delay_renewals(&self, delay: Duration) {
        *self.renew_delay.lock() = delay;
    }

    pub fn fail_releases(&self) {
        *self.release_fails.lock() = true;
    }

    pub fn acquire_calls(&self) -> usize {
        *self.acquire_calls.lock()
    }

    pub fn renewed(&self) -> Vec<String> {
        self.renewed.lock().clone()
    }

    pub fn released(&self) -> Vec<String> {
        self.released.lock().clone()
    }
}

fn rejected() -> StreamError {
    StreamError::Api(ApiError::new(-1125, "This listenKey does not exist."))
}

impl ListenKeyService for MockListenKeys {
    async fn acquire(&self) -> Result<String, StreamError> {
        let call = {
            let mut calls = self.acquire_calls.lock();
            *calls += 1;
            *calls
        };
        let delay = *self.acquire_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let succeed = self.acquire_script.lock().pop_front().unwrap_or(true);
        if succeed {
            Ok(format!("key-{}", call))
        } else {
            Err(StreamError::Api(ApiError::new(-2015, "Invalid API-key")))
        }
    }

    async fn renew(&self, listen_key: &str) -> Result<(), StreamError> {
        self.renewed.lock().push(listen_key.to_string());
        let delay = *self.renew_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let succeed = self.renew_script.lock().pop_front().unwrap_or(true);
        if succeed { Ok(()) } else { Err(rejected()) }
    }

    async fn release(&self, listen_key: &str) -> Result<(), StreamError> {
        self.released.lock().push(listen_key.to_string());
        if *self.release_fails.lock() {
            Err(rejected())
        } else {
            Ok(())
        }
    }
}
