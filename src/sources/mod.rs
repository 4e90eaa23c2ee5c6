//! Token sources.
//!
//! `FetchToken` is the seam between the token cache and the issuer; the only
//! production issuer is the OAuth2 client-credentials endpoint.

pub mod fetch;
pub mod oauth2;

pub use fetch::FetchToken;
pub use oauth2::OAuth2Source;
