//! Listen key service abstraction.
//!
//! User streams only talk to the REST API through [`ListenKeyService`], so a
//! session can be driven by [`ListenKeyClient`](crate::rest::ListenKeyClient)
//! or by any other implementation, such as a scripted mock in tests.
//!
//! ```rust,ignore
//! use binance_stream_client::rest::ListenKeyService;
//!
//! async fn refresh<S: ListenKeyService>(service: &S) -> binance_stream_client::Result<String> {
//!     let key = service.acquire().await?;
//!     service.renew(&key).await?;
//!     Ok(key)
//! }
//! ```

use std::future::Future;

use crate::error::StreamError;

/// Acquire, renew and release listen keys for one user stream kind.
pub trait ListenKeyService: Send + Sync + 'static {
    /// Obtain a listen key, creating one if none is active.
    fn acquire(&self) -> impl Future<Output = Result<String, StreamError>> + Send;

    /// Extend the validity of a listen key.
    fn renew(&self, listen_key: &str) -> impl Future<Output = Result<(), StreamError>> + Send;

    /// Invalidate a listen key.
    fn release(&self, listen_key: &str) -> impl Future<Output = Result<(), StreamError>> + Send;
}
