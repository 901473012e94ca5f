//! HTTP client module for the catalog backend.
//!
//! This module provides the `CatalogApi` trait the data controllers fetch
//! through, and `ApiClient`, its implementation over two unauthenticated
//! JSON endpoints (categories, dishes of a category).
//!
//! Every call is a single GET. Nothing is retried; failures are classified
//! into `FetchError` so callers can tell a dead network from a bad server.

pub mod client;
pub mod error;

pub use client::{ApiClient, CatalogApi, Endpoints};
pub use error::FetchError;
