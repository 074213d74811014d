//! Listen key management over the Binance REST API.
//!
//! User data streams are authorized by a listen key that expires after 60
//! minutes unless renewed. [`ListenKeyService`] is the seam the session core
//! uses; [`ListenKeyClient`] implements it for the spot, margin and futures
//! endpoints.

mod client;
mod endpoints;
mod traits;

pub use client::{ListenKeyClient, ListenKeyClientBuilder};
pub use endpoints::*;
pub use traits::ListenKeyService;
