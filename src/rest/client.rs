//! Binance listen key REST client.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use reqwest_tracing::TracingMiddleware;
use serde::Deserialize;

use crate::auth::CredentialsProvider;
use crate::error::{ApiError, StreamError};
use crate::rest::endpoints::{self, API_KEY_HEADER};
use crate::rest::traits::ListenKeyService;
use crate::types::UserStreamKind;

/// REST client for the listen key endpoints of one user stream kind.
///
/// # Example
///
/// ```rust,no_run
/// use binance_stream_client::auth::StaticCredentials;
/// use binance_stream_client::rest::ListenKeyClient;
/// use binance_stream_client::types::UserStreamKind;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ListenKeyClient::builder(UserStreamKind::Spot)
///         .credentials(Arc::new(StaticCredentials::new("api_key")))
///         .build();
///
///     let listen_key = client.create_listen_key().await?;
///     client.keep_alive_listen_key(&listen_key).await?;
///     client.close_listen_key(&listen_key).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ListenKeyClient {
    http_client: ClientWithMiddleware,
    base_url: String,
    kind: UserStreamKind,
    credentials: Option<Arc<dyn CredentialsProvider>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListenKeyResponse {
    listen_key: String,
}

impl ListenKeyClient {
    /// Create a client builder for the given user stream kind.
    pub fn builder(kind: UserStreamKind) -> ListenKeyClientBuilder {
        ListenKeyClientBuilder::new(kind)
    }

    /// User stream kind served by this client.
    pub fn kind(&self) -> UserStreamKind {
        self.kind
    }

    /// Get the REST base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create (or fetch the active) listen key.
    pub async fn create_listen_key(&self) -> Result<String, StreamError> {
        let response: ListenKeyResponse = self.send(Method::POST, None).await?;
        Ok(response.listen_key)
    }

    /// Extend a listen key's validity by 60 minutes.
    pub async fn keep_alive_listen_key(&self, listen_key: &str) -> Result<(), StreamError> {
        let _: serde_json::Value = self.send(Method::PUT, Some(listen_key)).await?;
        Ok(())
    }

    /// Close a listen key.
    pub async fn close_listen_key(&self, listen_key: &str) -> Result<(), StreamError> {
        let _: serde_json::Value = self.send(Method::DELETE, Some(listen_key)).await?;
        Ok(())
    }

    async fn send<T>(&self, method: Method, listen_key: Option<&str>) -> Result<T, StreamError>
    where
        T: serde::de::DeserializeOwned,
    {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(StreamError::MissingCredentials)?;
        let api_key = credentials.get_credentials().expose_api_key();

        let path = endpoints::listen_key_path(self.kind);
        let url = match listen_key {
            Some(listen_key) => {
                let query = serde_urlencoded::to_string(&[("listenKey", listen_key)])
                    .map_err(|e| StreamError::InvalidResponse(e.to_string()))?;
                format!("{}{}?{}", self.base_url, path, query)
            }
            None => format!("{}{}", self.base_url, path),
        };

        let response = self
            .http_client
            .request(method, &url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;

        self.parse_response(response).await
    }

    /// Parse a Binance response, mapping `{code, msg}` error bodies to [`StreamError::Api`].
    async fn parse_response<T>(&self, response: reqwest::Response) -> Result<T, StreamError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiError>(&body) {
                Ok(api_error) => StreamError::Api(api_error),
                Err(_) => StreamError::InvalidResponse(format!("HTTP {}: {}", status, body)),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            StreamError::InvalidResponse(format!("Failed to parse response: {}. Body: {}", e, body))
        })
    }
}

impl ListenKeyService for ListenKeyClient {
    async fn acquire(&self) -> Result<String, StreamError> {
        self.create_listen_key().await
    }

    async fn renew(&self, listen_key: &str) -> Result<(), StreamError> {
        self.keep_alive_listen_key(listen_key).await
    }

    async fn release(&self, listen_key: &str) -> Result<(), StreamError> {
        self.close_listen_key(listen_key).await
    }
}

impl std::fmt::Debug for ListenKeyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenKeyClient")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

/// Builder for [`ListenKeyClient`].
pub struct ListenKeyClientBuilder {
    kind: UserStreamKind,
    base_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    user_agent: Option<String>,
    max_retries: u32,
}

impl ListenKeyClientBuilder {
    /// Create a new builder with the default base URL for `kind`.
    pub fn new(kind: UserStreamKind) -> Self {
        Self {
            kind,
            base_url: endpoints::base_url(kind).to_string(),
            credentials: None,
            user_agent: None,
            max_retries: 3,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the credentials provider.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the maximum number of retries for transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build the client.
    pub fn build(self) -> ListenKeyClient {
        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("binance-stream-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("binance-stream-client"));
        headers.insert(USER_AGENT, header_value);

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(self.max_retries);

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        ListenKeyClient {
            http_client: client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            kind: self.kind,
            credentials: self.credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticCredentials;

    #[test]
    fn test_builder_defaults_per_kind() {
        let spot = ListenKeyClient::builder(UserStreamKind::Spot).build();
        assert_eq!(spot.base_url(), "https://api.binance.com");

        let margin = ListenKeyClient::builder(UserStreamKind::Margin).build();
        assert_eq!(margin.base_url(), "https://api.binance.com");
        assert_eq!(margin.kind(), UserStreamKind::Margin);

        let futures = ListenKeyClient::builder(UserStreamKind::Futures)
            .base_url("http://localhost:8080/")
            .build();
        assert_eq!(futures.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_debug_hides_credentials() {
        let client = ListenKeyClient::builder(UserStreamKind::Spot)
            .credentials(Arc::new(StaticCredentials::new("secret-api-key")))
            .build();
        let debug = format!("{:?}", client);
        assert!(debug.contains("has_credentials: true"));
        assert!(!debug.contains("secret-api-key"));
    }

    #[test]
    fn test_missing_credentials() {
        let client = ListenKeyClient::builder(UserStreamKind::Spot)
            .base_url("http://127.0.0.1:1")
            .build();
        let result = tokio_test::block_on(client.create_listen_key());
        assert!(matches!(result, Err(StreamError::MissingCredentials)));
    }
}
