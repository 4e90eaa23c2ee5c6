//! # CDEK proxy library
//!
//! Hides the CDEK OAuth2 client credentials from browser clients and exposes
//! city lookup and tariff calculation over a small HTTP API.
//!
//! Modules:
//! - `cache`: the shared access token cache
//! - `sources`: OAuth2 client-credentials token source
//! - `upstream`: CDEK API gateway and wire types
//! - `server`: axum router, handlers, CORS
//! - `config`: settings and loader

pub mod cache;
pub mod config;
pub mod error;
pub mod observability;
pub mod server;
pub mod sources;
pub mod upstream;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::token_cache::TokenCache;
pub use crate::error::{AuthError, ProxyError};
