use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng as _;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use time::OffsetDateTime;
use zeroize::Zeroizing;

use crate::{
    cipher::{self, BoundCipher, EncryptAdapter},
    config::SealedCookieConfig,
    context::RequestContext,
    error::{CipherError, EnvironmentMismatch, Error, Result},
    format::{self, CredentialRecord},
    transport::CookieTransport,
};

const IDENTIFIER_BYTES: usize = 18;
const BLOCK_KEY_INFO: &[u8] = b"sealed-auth-cookie/block-cipher/key";
const BLOCK_IV_INFO: &[u8] = b"sealed-auth-cookie/block-cipher/iv";

/// Seals credentials into a cookie and verifies them on the way back.
///
/// A write stores `{id, exp, data, seal}` where `id` is fresh for every write and `seal` is an
/// HMAC over the plaintext payload keyed by a per-cookie key derived from the server key, `id`
/// and `exp`. A read decrypts `data`, rebuilds the whole record from `(id, exp, payload)` and
/// accepts it only if every field comes out identical. Anything that fails along the way reads as
/// absent.
#[derive(Debug, Clone)]
pub struct SealedCookieStore {
    config: SealedCookieConfig,
}

impl SealedCookieStore {
    pub fn new(config: SealedCookieConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SealedCookieConfig {
        &self.config
    }

    /// Fails when the request cannot satisfy `is_secure` or `is_linked_with_ssl`.
    pub fn check_environment(
        &self,
        context: &RequestContext,
    ) -> std::result::Result<(), EnvironmentMismatch> {
        if self.config.is_secure() && !context.is_secure() {
            return Err(EnvironmentMismatch::InsecureTransport);
        }

        if self.config.is_linked_with_ssl() && context.ssl_session_id().is_none() {
            return Err(EnvironmentMismatch::MissingSslSessionId);
        }

        Ok(())
    }

    /// `HMAC(server_key, [identifier, expiration])` as hex. Never the server key itself.
    pub fn derive_cookie_key(
        &self,
        identifier: &str,
        expiration: Option<i64>,
    ) -> Zeroizing<String> {
        let material = Value::Array(vec![Value::from(identifier), expiration_value(expiration)]);

        Zeroizing::new(
            self.config
                .hash_algorithm()
                .hmac_hex(self.config.server_key(), material.to_string().as_bytes()),
        )
    }

    /// Binds the configured adapter to the key material of one cookie.
    pub fn bind_encrypt_adapter(
        &self,
        identifier: &str,
        expiration: Option<i64>,
    ) -> std::result::Result<Option<BoundCipher>, CipherError> {
        let Some(adapter) = self.config.encrypt_adapter() else {
            return Ok(None);
        };

        let cookie_key = self.derive_cookie_key(identifier, expiration);

        let bound = match adapter {
            EncryptAdapter::BlockCipher(adapter) => {
                let mut key = Zeroizing::new(vec![0u8; adapter.key_size()]);
                let mut vector = vec![0u8; adapter.iv_size()];
                cipher::expand(cookie_key.as_bytes(), BLOCK_KEY_INFO, &mut key)?;
                cipher::expand(cookie_key.as_bytes(), BLOCK_IV_INFO, &mut vector)?;
                adapter.with_encryption(&key, &vector)?
            }
            EncryptAdapter::Passphrase(adapter) => adapter.with_passphrase(&cookie_key)?,
        };

        Ok(Some(bound))
    }

    /// HMAC over `[identifier, expiration, payload]`, plus the SSL session id when the store is
    /// linked with SSL.
    pub fn create_seal(
        &self,
        context: &RequestContext,
        identifier: &str,
        expiration: Option<i64>,
        payload: &Value,
    ) -> String {
        let mut seal_data = vec![
            Value::from(identifier),
            expiration_value(expiration),
            payload.clone(),
        ];

        if self.config.is_linked_with_ssl() {
            seal_data.push(context.ssl_session_id().map_or(Value::Null, Value::from));
        }

        let cookie_key = self.derive_cookie_key(identifier, expiration);
        self.config.hash_algorithm().hmac_hex(
            cookie_key.as_bytes(),
            Value::Array(seal_data).to_string().as_bytes(),
        )
    }

    /// Seals `payload` and returns the cookie value without touching any cookie jar.
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        context: &RequestContext,
        payload: &T,
    ) -> Result<String> {
        self.seal(context, payload).map(|(value, _)| value)
    }

    /// Opens a cookie value. `Ok(None)` covers malformed, expired and tampered values alike.
    pub fn decode(&self, context: &RequestContext, value: &str) -> Result<Option<Value>> {
        self.check_environment(context)?;
        Ok(self.open(context, value))
    }

    pub fn write<J, T>(&self, transport: &J, context: &RequestContext, payload: &T) -> Result<()>
    where
        J: CookieTransport + ?Sized,
        T: Serialize + ?Sized,
    {
        let (value, expiration) = self.seal(context, payload)?;
        transport.add(self.config.build_cookie(value, expiration));
        Ok(())
    }

    /// Reads the payload back. A verified payload that does not fit `T` reads as absent.
    pub fn read<J, T>(&self, transport: &J, context: &RequestContext) -> Result<Option<T>>
    where
        J: CookieTransport + ?Sized,
        T: DeserializeOwned,
    {
        let Some(value) = self.read_value(transport, context)? else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) => {
                tracing::warn!(
                    cookie = %self.config.name(),
                    err = %err,
                    "verified credential has an unexpected shape"
                );
                Ok(None)
            }
        }
    }

    pub fn read_value<J>(&self, transport: &J, context: &RequestContext) -> Result<Option<Value>>
    where
        J: CookieTransport + ?Sized,
    {
        self.check_environment(context)?;

        let Some(raw) = transport.get(self.config.name()) else {
            return Ok(None);
        };

        Ok(self.open(context, &raw))
    }

    pub fn clear<J: CookieTransport + ?Sized>(&self, transport: &J) {
        transport.remove(self.config.removal_cookie());
    }

    pub fn is_empty<J: CookieTransport + ?Sized>(&self, transport: &J) -> bool {
        transport.get(self.config.name()).is_none()
    }

    fn seal<T: Serialize + ?Sized>(
        &self,
        context: &RequestContext,
        payload: &T,
    ) -> Result<(String, Option<i64>)> {
        self.check_environment(context)?;

        let payload = serde_json::to_value(payload).map_err(|err| Error::Encode(err.to_string()))?;
        ensure_readable(&payload)?;
        let expiration = self
            .config
            .expiration_timestamp(OffsetDateTime::now_utc())?;
        let identifier = fresh_identifier();

        let cipher = self.bind_encrypt_adapter(&identifier, expiration)?;
        let record =
            self.create_record(context, cipher.as_ref(), identifier, expiration, &payload)?;
        let value = format::encode_record(&record)?;

        if value.len() > self.config.max_cookie_bytes() {
            return Err(Error::Encode(format!(
                "Cookie value exceeds max_cookie_bytes ({} > {})",
                value.len(),
                self.config.max_cookie_bytes()
            )));
        }

        Ok((value, expiration))
    }

    fn open(&self, context: &RequestContext, raw: &str) -> Option<Value> {
        let record = match format::decode_record(raw) {
            Ok(record) => record,
            Err(err) => {
                tracing::debug!(
                    cookie = %self.config.name(),
                    err = %err,
                    "credential cookie is malformed"
                );
                return None;
            }
        };

        let cipher = match self.bind_encrypt_adapter(&record.id, record.exp) {
            Ok(cipher) => cipher,
            Err(err) => {
                tracing::debug!(
                    cookie = %self.config.name(),
                    err = %err,
                    "credential key binding failed"
                );
                return None;
            }
        };

        self.verify(context, cipher.as_ref(), &record)
    }

    fn verify(
        &self,
        context: &RequestContext,
        cipher: Option<&BoundCipher>,
        record: &CredentialRecord,
    ) -> Option<Value> {
        if record
            .exp
            .is_some_and(|exp| exp < OffsetDateTime::now_utc().unix_timestamp())
        {
            tracing::debug!(cookie = %self.config.name(), "credential cookie has expired");
            return None;
        }

        let Some(payload) = prepare_for_read(cipher, &record.data) else {
            tracing::debug!(
                cookie = %self.config.name(),
                "credential payload could not be recovered"
            );
            return None;
        };

        let rebuilt = self
            .create_record(context, cipher, record.id.clone(), record.exp, &payload)
            .ok()?;

        if !rebuilt.matches(record) {
            tracing::debug!(cookie = %self.config.name(), "credential cookie failed verification");
            return None;
        }

        Some(payload)
    }

    pub(crate) fn create_record(
        &self,
        context: &RequestContext,
        cipher: Option<&BoundCipher>,
        identifier: String,
        expiration: Option<i64>,
        payload: &Value,
    ) -> std::result::Result<CredentialRecord, CipherError> {
        let data = prepare_for_write(cipher, payload)?;
        let seal = self.create_seal(context, &identifier, expiration, payload);

        Ok(CredentialRecord {
            id: identifier,
            exp: expiration,
            data,
            seal,
        })
    }
}

fn prepare_for_write(
    cipher: Option<&BoundCipher>,
    payload: &Value,
) -> std::result::Result<String, CipherError> {
    let bytes = payload.to_string().into_bytes();
    let bytes = match cipher {
        Some(cipher) => cipher.encrypt(&bytes)?,
        None => bytes,
    };
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn prepare_for_read(cipher: Option<&BoundCipher>, data: &str) -> Option<Value> {
    let bytes = URL_SAFE_NO_PAD.decode(data).ok()?;
    let bytes = match cipher {
        Some(cipher) => cipher.decrypt(&bytes).ok()?,
        None => bytes,
    };
    serde_json::from_slice(&bytes).ok()
}

/// A payload the read path cannot parse back would always read as absent.
fn ensure_readable(payload: &Value) -> Result<()> {
    serde_json::from_str::<Value>(&payload.to_string())
        .map(|_| ())
        .map_err(|err| Error::Encode(format!("payload does not parse back: {err}")))
}

fn expiration_value(expiration: Option<i64>) -> Value {
    expiration.map_or(Value::Null, Value::from)
}

fn fresh_identifier() -> String {
    let bytes: [u8; IDENTIFIER_BYTES] = rand::thread_rng().r#gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
