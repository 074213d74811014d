//! Credential management for Binance user data streams.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Default environment variable holding the API key.
const API_KEY_VAR: &str = "BINANCE_API_KEY";

/// API credentials for listen key management.
///
/// Listen key endpoints only require the API key (sent as `X-MBX-APIKEY`);
/// no request signing is involved.
#[derive(Clone)]
pub struct Credentials {
    api_key: SecretString,
}

impl Credentials {
    /// Create new credentials from an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
        }
    }

    /// Get the API key for the request header.
    ///
    /// This method exposes the key - use carefully.
    pub fn expose_api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Trait for providing API credentials.
///
/// Implement this trait to customize how credentials are retrieved,
/// for example from a secrets manager.
pub trait CredentialsProvider: Send + Sync {
    /// Get the credentials.
    fn get_credentials(&self) -> &Credentials;
}

/// Static credentials provider that holds credentials directly.
#[derive(Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Create a new static credentials provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(api_key),
        }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl CredentialsProvider for Arc<StaticCredentials> {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Credentials provider that reads from environment variables.
///
/// By default, reads from `BINANCE_API_KEY`.
pub struct EnvCredentials {
    credentials: Credentials,
}

impl EnvCredentials {
    /// Create credentials from the default environment variable.
    ///
    /// # Panics
    ///
    /// Panics if `BINANCE_API_KEY` is not set.
    pub fn from_env() -> Self {
        Self::from_env_var(API_KEY_VAR)
    }

    /// Create credentials from a custom environment variable name.
    ///
    /// # Panics
    ///
    /// Panics if the environment variable is not set.
    pub fn from_env_var(key_var: &str) -> Self {
        let api_key = std::env::var(key_var)
            .unwrap_or_else(|_| panic!("Environment variable {key_var} not set"));

        Self {
            credentials: Credentials::new(api_key),
        }
    }

    /// Try to create credentials from the default environment variable.
    ///
    /// Returns `None` if the environment variable is not set.
    pub fn try_from_env() -> Option<Self> {
        Self::try_from_env_var(API_KEY_VAR)
    }

    /// Try to create credentials from a custom environment variable name.
    pub fn try_from_env_var(key_var: &str) -> Option<Self> {
        let api_key = std::env::var(key_var).ok()?;

        Some(Self {
            credentials: Credentials::new(api_key),
        })
    }
}

impl CredentialsProvider for EnvCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacted() {
        let creds = Credentials::new("super_secret_key");
        let debug_str = format!("{:?}", creds);
        assert!(!debug_str.contains("super_secret_key"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_static_credentials() {
        let provider = StaticCredentials::new("key");
        assert_eq!(provider.get_credentials().expose_api_key(), "key");
    }

    #[test]
    fn test_env_credentials_missing_var() {
        assert!(EnvCredentials::try_from_env_var("BINANCE_STREAM_CLIENT_UNSET_VAR").is_none());
    }
}
