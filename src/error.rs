use thiserror::Error;

/// An option was rejected while building a [`SealedCookieConfig`](crate::SealedCookieConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("server key must not be empty")]
    EmptyServerKey,

    #[error("invalid cookie name `{0}`")]
    InvalidName(String),

    #[error("cookie path `{0}` must start with `/`")]
    InvalidPath(String),

    #[error("cookie domain must not be empty")]
    EmptyDomain,

    #[error("lifetime must not be negative")]
    NegativeLifetime,

    #[error("lifetime is too large to compute an expiration")]
    LifetimeTooLarge,

    #[error("hash algorithm `{0}` is not available")]
    UnsupportedHashAlgorithm(String),

    #[error("unsupported encrypt adapter: {0}")]
    UnsupportedEncryptAdapter(String),

    #[error("invalid option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },
}

/// The request does not satisfy the transport requirements of the configuration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentMismatch {
    #[error("`is_secure` is set but the request was not made over HTTPS")]
    InsecureTransport,

    #[error("`is_linked_with_ssl` is set but no SSL session id was found")]
    MissingSslSessionId,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid key or vector length")]
    InvalidKeyMaterial,

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed")]
    Decrypt,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Environment(#[from] EnvironmentMismatch),

    #[error("encrypt adapter: {0}")]
    Cipher(#[from] CipherError),

    #[error("encode: {0}")]
    Encode(String),

    #[error("decode: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
