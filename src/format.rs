//! Helpers for encoding/decoding the credential cookie payload format.
//!
//! This is primarily useful for testing and debugging.
//!
//! Note: the on-wire format is versioned, but it is still considered an implementation detail and
//! may evolve.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

const VERSION: u8 = 1;
const COMPRESSION_LEVEL: i32 = 9;
const MAX_DECOMPRESSED_BYTES: usize = 64 * 1024;

/// The record stored in the cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Fresh per write, never reused.
    pub id: String,
    /// UNIX timestamp after which the record is invalid.
    pub exp: Option<i64>,
    /// URL-safe base64 of the serialized, possibly encrypted, payload.
    pub data: String,
    pub seal: String,
}

impl CredentialRecord {
    /// Field-for-field equality, comparing the seal in constant time.
    pub(crate) fn matches(&self, other: &CredentialRecord) -> bool {
        let seal_eq: bool = self.seal.as_bytes().ct_eq(other.seal.as_bytes()).into();
        seal_eq && self.id == other.id && self.exp == other.exp && self.data == other.data
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u8,
    record: CredentialRecord,
}

/// Encode a [`CredentialRecord`] into the cookie value.
pub fn encode_record(record: &CredentialRecord) -> Result<String> {
    let envelope = Envelope {
        v: VERSION,
        record: record.clone(),
    };

    let bytes = serde_json::to_vec(&envelope).map_err(|err| Error::Encode(err.to_string()))?;
    let compressed = zstd::bulk::compress(&bytes, COMPRESSION_LEVEL)
        .map_err(|err| Error::Encode(err.to_string()))?;

    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Decode a cookie value into a [`CredentialRecord`].
pub fn decode_record(value: &str) -> Result<CredentialRecord> {
    let compressed = URL_SAFE_NO_PAD
        .decode(value.as_bytes())
        .map_err(|err| Error::Decode(err.to_string()))?;

    let bytes = zstd::bulk::decompress(&compressed, MAX_DECOMPRESSED_BYTES)
        .map_err(|err| Error::Decode(err.to_string()))?;

    let envelope: Envelope =
        serde_json::from_slice(&bytes).map_err(|err| Error::Decode(err.to_string()))?;

    if envelope.v != VERSION {
        return Err(Error::Decode(format!(
            "Unsupported credential cookie version: {}",
            envelope.v
        )));
    }

    Ok(envelope.record)
}
