//! Common types used across the Binance stream client.

pub mod common;

pub use common::*;
