//! Error types for the Binance stream client.

use serde::Deserialize;
use thiserror::Error;

/// The main error type for all stream client operations.
#[derive(Error, Debug)]
pub enum StreamError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// WebSocket communication error (with message)
    #[error("WebSocket error: {0}")]
    WebSocketMsg(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Binance API returned an error
    #[error("Binance API error: {0}")]
    Api(ApiError),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// WebSocket connection closed
    #[error("WebSocket connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for the closure
        reason: String,
    },

    /// A subscription was requested without any stream target
    #[error("At least one stream target is required")]
    NoTargets,

    /// Operation not allowed in the current session state
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Missing required credentials
    #[error("Missing credentials: an API key is required for user data streams")]
    MissingCredentials,
}

/// Error body returned by the Binance REST API.
///
/// Binance reports failures as `{"code": -1125, "msg": "This listenKey does not exist."}`
/// together with a non-2xx HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    /// Numeric Binance error code (negative for request errors)
    pub code: i64,
    /// Human-readable error message
    pub msg: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.msg)
    }
}

impl ApiError {
    /// Create a new API error from code and message.
    pub fn new(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    /// Check if the listen key is unknown or already expired.
    pub fn is_unknown_listen_key(&self) -> bool {
        self.code == error_codes::LISTEN_KEY_NOT_FOUND
    }

    /// Check if the API key was rejected.
    pub fn is_invalid_api_key(&self) -> bool {
        self.code == error_codes::REJECTED_MBX_KEY || self.code == error_codes::INVALID_API_KEY
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.code == error_codes::TOO_MANY_REQUESTS
    }
}

/// Known Binance error codes relevant to user data streams.
pub mod error_codes {
    /// Too many requests queued or sent
    pub const TOO_MANY_REQUESTS: i64 = -1003;
    /// API key format invalid
    pub const INVALID_API_KEY: i64 = -2014;
    /// Invalid API key, IP, or permissions for action
    pub const REJECTED_MBX_KEY: i64 = -2015;
    /// The listen key does not exist
    pub const LISTEN_KEY_NOT_FOUND: i64 = -1125;
}
