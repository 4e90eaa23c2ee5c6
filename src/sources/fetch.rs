use crate::error::AuthError;

/// One authentication exchange with a token issuer.
///
/// Implementations perform exactly one upstream call per invocation and never
/// retry; caching and coalescing are the caller's concern.
pub trait FetchToken {
    fn fetch_token(&self) -> impl std::future::Future<Output = Result<String, AuthError>> + Send;
}
