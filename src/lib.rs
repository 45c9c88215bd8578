//! Tamper-evident credential storage in a single HTTP cookie.
//!
//! [`SealedCookieStore`] keeps a small authentication payload on the client instead of on the
//! server. Every write produces a record with a fresh identifier, an optional expiration, the
//! (optionally encrypted) payload and an HMAC seal. The seal is keyed by material derived from the
//! server key and the record's own identifier and expiration, so no key is ever reused across
//! writes and the server key itself never touches a cookie.
//!
//! Reads are verified by rebuilding the entire record from its decrypted payload and comparing it
//! field for field with what the client sent. Malformed, expired and tampered cookies all read as
//! absent; only a request that violates the configured transport requirements (`is_secure`,
//! `is_linked_with_ssl`) is an error.
//!
//! # Usage
//! [`SealedCookieLayer`] wraps a service in `tower_cookies::CookieManager` and inserts an
//! [`AuthCookie`] into each request. With the `axum` feature (enabled by default) [`AuthCookie`]
//! is also an extractor.
//!
//! ```no_run
//! use sealed_auth_cookie::{AuthCookie, SealedCookieConfig, SealedCookieLayer};
//!
//! let config = SealedCookieConfig::builder("a long random server secret")
//!     .with_lifetime(time::Duration::hours(8))
//!     .build()
//!     .expect("valid cookie configuration");
//! let layer = SealedCookieLayer::new(config);
//!
//! fn handle(auth: &AuthCookie) -> sealed_auth_cookie::Result<()> {
//!     if auth.read::<String>()?.is_none() {
//!         auth.write("uid:42")?;
//!     }
//!     Ok(())
//! }
//! # let _ = (layer, handle);
//! ```

mod cipher;
mod config;
mod context;
mod error;
pub mod format;
mod handle;
mod hash;
pub mod layer;
mod store;
mod transport;

pub use tower_cookies::{Cookie, Cookies};

pub use crate::cipher::{
    BlockCipherAdapter, BlockCipherAlgorithm, BoundCipher, EncryptAdapter, PassphraseAdapter,
};
pub use crate::config::{
    DEFAULT_COOKIE_NAME, SealedCookieConfig, SealedCookieConfigBuilder, SealedCookieOptions,
};
pub use crate::context::{RequestContext, TlsSession};
pub use crate::error::{CipherError, ConfigurationError, EnvironmentMismatch, Error, Result};
pub use crate::format::CredentialRecord;
pub use crate::handle::AuthCookie;
pub use crate::hash::HashAlgorithm;
pub use crate::layer::SealedCookieLayer;
pub use crate::store::SealedCookieStore;
pub use crate::transport::CookieTransport;
