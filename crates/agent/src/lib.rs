//! Offline cache and notification agent
//!
//! Everything the service worker does, written against the [`Host`] trait so it
//! can run in the browser (see the `service-worker` crate) or against the
//! in-memory host in tests.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod host;
pub mod model;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

#[cfg(feature = "wasm")]
pub mod utils;
#[cfg(feature = "wasm")]
pub mod web;

pub use config::*;
pub use dispatch::*;
pub use error::*;
pub use host::*;
