//! Binance REST endpoint constants for listen key management.

use crate::types::UserStreamKind;

/// Base URL of the spot and margin REST API.
pub const SPOT_BASE_URL: &str = "https://api.binance.com";

/// Base URL of the USD-M futures REST API.
pub const FUTURES_BASE_URL: &str = "https://fapi.binance.com";

/// Spot user data stream listen key.
pub const SPOT_LISTEN_KEY: &str = "/api/v3/userDataStream";

/// Cross margin user data stream listen key.
pub const MARGIN_LISTEN_KEY: &str = "/sapi/v1/userDataStream";

/// USD-M futures user data stream listen key.
pub const FUTURES_LISTEN_KEY: &str = "/fapi/v1/listenKey";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Default REST base URL for a user stream kind.
pub fn base_url(kind: UserStreamKind) -> &'static str {
    match kind {
        UserStreamKind::Spot | UserStreamKind::Margin => SPOT_BASE_URL,
        UserStreamKind::Futures => FUTURES_BASE_URL,
    }
}

/// Listen key endpoint path for a user stream kind.
pub fn listen_key_path(kind: UserStreamKind) -> &'static str {
    match kind {
        UserStreamKind::Spot => SPOT_LISTEN_KEY,
        UserStreamKind::Margin => MARGIN_LISTEN_KEY,
        UserStreamKind::Futures => FUTURES_LISTEN_KEY,
    }
}
