//! Authentication module for Binance user data streams.
//!
//! Listen key endpoints are authenticated by API key alone, so this module
//! only deals with holding that key safely and providing it to clients.

mod credentials;

pub use credentials::{Credentials, CredentialsProvider, EnvCredentials, StaticCredentials};
