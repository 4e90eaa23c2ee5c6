pub mod token;
pub mod token_cache;

pub use token::CachedCredential;
pub use token_cache::TokenCache;
