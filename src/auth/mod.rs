//! OAuth2 client-credentials authentication
//!
//! The `TokenProvider` exchanges the stored client credentials for a bearer
//! token and caches it, refreshing only when the token is absent or expired.
//! A rejected token request is fatal: mis-issued or revoked credentials will
//! not self-heal, so there is no retry.

mod token;

pub use token::{CachedToken, TokenProvider};
