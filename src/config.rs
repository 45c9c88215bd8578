use std::{borrow::Cow, fmt};

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tower_cookies::Cookie;
use zeroize::Zeroizing;

use crate::{
    cipher::{BlockCipherAdapter, BlockCipherAlgorithm, EncryptAdapter, PassphraseAdapter},
    error::{ConfigurationError, Error, Result as StoreResult},
    hash::HashAlgorithm,
};

pub const DEFAULT_COOKIE_NAME: &str = "auth";

/// Validated, immutable store settings. Built with [`SealedCookieConfig::builder`].
#[derive(Clone)]
pub struct SealedCookieConfig {
    server_key: Zeroizing<String>,
    name: Cow<'static, str>,
    domain: Option<Cow<'static, str>>,
    path: Cow<'static, str>,
    lifetime: Option<Duration>,
    secure: bool,
    linked_with_ssl: bool,
    http_only: bool,
    hash_algorithm: HashAlgorithm,
    encrypt_adapter: Option<EncryptAdapter>,
    max_cookie_bytes: usize,
}

impl SealedCookieConfig {
    pub fn builder<K: Into<String>>(server_key: K) -> SealedCookieConfigBuilder {
        SealedCookieConfigBuilder::new(server_key)
    }

    /// Builds a config from a loosely typed options object.
    ///
    /// Known keys are merged over the defaults; unknown keys are ignored. A known key holding a
    /// value of the wrong shape is an error.
    pub fn from_json<K: Into<String>>(
        server_key: K,
        options: &Value,
    ) -> Result<Self, ConfigurationError> {
        let map = options
            .as_object()
            .ok_or_else(|| ConfigurationError::InvalidOption {
                key: "options".into(),
                reason: "expected an object".into(),
            })?;

        let mut parsed = SealedCookieOptions::default();
        for (key, value) in map {
            match key.as_str() {
                "name" => parsed.name = option_field(key, value)?,
                "domain" => parsed.domain = option_field(key, value)?,
                "path" => parsed.path = option_field(key, value)?,
                "lifetime" => parsed.lifetime = option_field(key, value)?,
                "is_secure" | "isSecure" => parsed.is_secure = option_field(key, value)?,
                "is_linked_with_ssl" | "isLinkedWithSSL" => {
                    parsed.is_linked_with_ssl = option_field(key, value)?
                }
                "http_only" | "httpOnly" => parsed.http_only = option_field(key, value)?,
                "hash_algorithm" | "hashAlgorithm" => {
                    parsed.hash_algorithm = option_field(key, value)?
                }
                "encrypt_adapter" | "encryptAdapter" => {
                    parsed.encrypt_adapter = (!value.is_null()).then(|| value.clone())
                }
                "max_cookie_bytes" | "maxCookieBytes" => {
                    parsed.max_cookie_bytes = option_field(key, value)?
                }
                _ => tracing::debug!(key = %key, "ignoring unknown credential cookie option"),
            }
        }

        Self::from_options(server_key, parsed)
    }

    pub fn from_options<K: Into<String>>(
        server_key: K,
        options: SealedCookieOptions,
    ) -> Result<Self, ConfigurationError> {
        let mut builder = Self::builder(server_key);

        if let Some(name) = options.name {
            builder = builder.with_name(name);
        }
        if let Some(domain) = options.domain {
            builder = builder.with_domain(domain);
        }
        if let Some(path) = options.path {
            builder = builder.with_path(path);
        }
        if let Some(minutes) = options.lifetime {
            let seconds = minutes
                .checked_mul(60)
                .ok_or(ConfigurationError::LifetimeTooLarge)?;
            builder = builder.with_lifetime(Duration::seconds(seconds));
        }
        if let Some(secure) = options.is_secure {
            builder = builder.with_secure(secure);
        }
        if let Some(linked) = options.is_linked_with_ssl {
            builder = builder.with_linked_with_ssl(linked);
        }
        if let Some(http_only) = options.http_only {
            builder = builder.with_http_only(http_only);
        }
        if let Some(algorithm) = options.hash_algorithm {
            builder = builder.with_hash_algorithm(algorithm);
        }
        if let Some(adapter) = options.encrypt_adapter {
            builder = builder.with_encrypt_adapter(parse_encrypt_adapter(adapter)?);
        }
        if let Some(max_cookie_bytes) = options.max_cookie_bytes {
            builder = builder.with_max_cookie_bytes(max_cookie_bytes);
        }

        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn is_linked_with_ssl(&self) -> bool {
        self.linked_with_ssl
    }

    pub fn http_only(&self) -> bool {
        self.http_only
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn encrypt_adapter(&self) -> Option<&EncryptAdapter> {
        self.encrypt_adapter.as_ref()
    }

    pub fn max_cookie_bytes(&self) -> usize {
        self.max_cookie_bytes
    }

    pub(crate) fn server_key(&self) -> &[u8] {
        self.server_key.as_bytes()
    }

    /// Absolute expiration for a record written at `now`; a zero lifetime never expires.
    pub(crate) fn expiration_timestamp(&self, now: OffsetDateTime) -> StoreResult<Option<i64>> {
        let Some(lifetime) = self.lifetime.filter(|lifetime| !lifetime.is_zero()) else {
            return Ok(None);
        };

        now.unix_timestamp()
            .checked_add(lifetime.whole_seconds())
            .map(Some)
            .ok_or_else(|| Error::Encode("lifetime overflows the expiration timestamp".into()))
    }

    pub(crate) fn build_cookie(&self, value: String, expiration: Option<i64>) -> Cookie<'static> {
        let mut cookie_builder = Cookie::build((self.name.clone(), value))
            .http_only(self.http_only)
            .secure(self.secure)
            .path(self.path.clone());

        if let Some(expiration) = expiration {
            let max_age = std::cmp::max(
                Duration::seconds(expiration - OffsetDateTime::now_utc().unix_timestamp()),
                Duration::ZERO,
            );
            cookie_builder = cookie_builder.max_age(max_age);
        }

        if let Some(domain) = self.domain.clone() {
            cookie_builder = cookie_builder.domain(domain);
        }

        cookie_builder.build()
    }

    pub(crate) fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.name.clone(), "");
        cookie.set_path(self.path.clone());
        if let Some(domain) = self.domain.clone() {
            cookie.set_domain(domain);
        }
        cookie
    }
}

impl fmt::Debug for SealedCookieConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedCookieConfig")
            .field("server_key", &"<redacted>")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("lifetime", &self.lifetime)
            .field("secure", &self.secure)
            .field("linked_with_ssl", &self.linked_with_ssl)
            .field("http_only", &self.http_only)
            .field("hash_algorithm", &self.hash_algorithm)
            .field("encrypt_adapter", &self.encrypt_adapter)
            .field("max_cookie_bytes", &self.max_cookie_bytes)
            .finish()
    }
}

/// Collects settings; nothing is validated until [`build`](Self::build).
#[derive(Clone)]
pub struct SealedCookieConfigBuilder {
    server_key: Zeroizing<String>,
    name: Cow<'static, str>,
    domain: Option<Cow<'static, str>>,
    path: Cow<'static, str>,
    lifetime: Option<Duration>,
    secure: bool,
    linked_with_ssl: bool,
    http_only: bool,
    hash_algorithm: Cow<'static, str>,
    encrypt_adapter: Option<EncryptAdapter>,
    max_cookie_bytes: usize,
}

impl SealedCookieConfigBuilder {
    fn new<K: Into<String>>(server_key: K) -> Self {
        Self {
            server_key: Zeroizing::new(server_key.into()),
            name: DEFAULT_COOKIE_NAME.into(),
            domain: None,
            path: "/".into(),
            lifetime: None,
            secure: false,
            linked_with_ssl: false,
            http_only: true,
            hash_algorithm: HashAlgorithm::default().name().into(),
            encrypt_adapter: None,
            max_cookie_bytes: 4096,
        }
    }

    #[must_use]
    pub fn with_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_domain<D: Into<Cow<'static, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn without_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    #[must_use]
    pub fn with_path<P: Into<Cow<'static, str>>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    #[must_use]
    pub fn without_lifetime(mut self) -> Self {
        self.lifetime = None;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_linked_with_ssl(mut self, linked_with_ssl: bool) -> Self {
        self.linked_with_ssl = linked_with_ssl;
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Selects the hash by registry name, e.g. `"sha256"`; see [`HashAlgorithm::SUPPORTED`].
    #[must_use]
    pub fn with_hash_algorithm<A: Into<Cow<'static, str>>>(mut self, algorithm: A) -> Self {
        self.hash_algorithm = algorithm.into();
        self
    }

    #[must_use]
    pub fn with_encrypt_adapter<A: Into<EncryptAdapter>>(mut self, adapter: A) -> Self {
        self.encrypt_adapter = Some(adapter.into());
        self
    }

    #[must_use]
    pub fn without_encrypt_adapter(mut self) -> Self {
        self.encrypt_adapter = None;
        self
    }

    #[must_use]
    pub fn with_max_cookie_bytes(mut self, max_cookie_bytes: usize) -> Self {
        self.max_cookie_bytes = max_cookie_bytes;
        self
    }

    pub fn build(self) -> Result<SealedCookieConfig, ConfigurationError> {
        if self.server_key.is_empty() {
            return Err(ConfigurationError::EmptyServerKey);
        }
        if !is_cookie_token(&self.name) {
            return Err(ConfigurationError::InvalidName(self.name.into_owned()));
        }
        if !self.path.starts_with('/') {
            return Err(ConfigurationError::InvalidPath(self.path.into_owned()));
        }
        if self.domain.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigurationError::EmptyDomain);
        }
        if self.lifetime.is_some_and(Duration::is_negative) {
            return Err(ConfigurationError::NegativeLifetime);
        }
        if self.lifetime.is_some_and(|lifetime| {
            OffsetDateTime::now_utc()
                .unix_timestamp()
                .checked_add(lifetime.whole_seconds())
                .is_none()
        }) {
            return Err(ConfigurationError::LifetimeTooLarge);
        }
        let hash_algorithm = self.hash_algorithm.parse::<HashAlgorithm>()?;

        Ok(SealedCookieConfig {
            server_key: self.server_key,
            name: self.name,
            domain: self.domain,
            path: self.path,
            lifetime: self.lifetime,
            secure: self.secure,
            linked_with_ssl: self.linked_with_ssl,
            http_only: self.http_only,
            hash_algorithm,
            encrypt_adapter: self.encrypt_adapter,
            max_cookie_bytes: self.max_cookie_bytes,
        })
    }
}

impl fmt::Debug for SealedCookieConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedCookieConfigBuilder")
            .field("server_key", &"<redacted>")
            .field("name", &self.name)
            .field("hash_algorithm", &self.hash_algorithm)
            .finish_non_exhaustive()
    }
}

/// The accepted option keys, e.g. for embedding in an application config file.
///
/// `lifetime` is in minutes. `encrypt_adapter` is an object such as
/// `{"type": "block_cipher", "algorithm": "aes-256-cbc"}` or `{"type": "passphrase"}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SealedCookieOptions {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub lifetime: Option<i64>,
    #[serde(alias = "isSecure")]
    pub is_secure: Option<bool>,
    #[serde(alias = "isLinkedWithSSL")]
    pub is_linked_with_ssl: Option<bool>,
    #[serde(alias = "httpOnly")]
    pub http_only: Option<bool>,
    #[serde(alias = "hashAlgorithm")]
    pub hash_algorithm: Option<String>,
    #[serde(alias = "encryptAdapter")]
    pub encrypt_adapter: Option<Value>,
    #[serde(alias = "maxCookieBytes")]
    pub max_cookie_bytes: Option<usize>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EncryptAdapterOption {
    BlockCipher {
        #[serde(default)]
        algorithm: BlockCipherAlgorithm,
    },
    Passphrase {},
}

fn parse_encrypt_adapter(value: Value) -> Result<EncryptAdapter, ConfigurationError> {
    let option: EncryptAdapterOption = serde_json::from_value(value)
        .map_err(|err| ConfigurationError::UnsupportedEncryptAdapter(err.to_string()))?;

    Ok(match option {
        EncryptAdapterOption::BlockCipher { algorithm } => {
            BlockCipherAdapter::new(algorithm).into()
        }
        EncryptAdapterOption::Passphrase {} => PassphraseAdapter::new().into(),
    })
}

fn option_field<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T, ConfigurationError> {
    serde_json::from_value(value.clone()).map_err(|err| ConfigurationError::InvalidOption {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')'
                        | b'<'
                        | b'>'
                        | b'@'
                        | b','
                        | b';'
                        | b':'
                        | b'\\'
                        | b'"'
                        | b'/'
                        | b'['
                        | b']'
                        | b'?'
                        | b'='
                        | b'{'
                        | b'}'
                )
        })
}
