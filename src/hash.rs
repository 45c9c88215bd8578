//! Keyed hashing used for cookie keys and seals.

use std::{fmt, str::FromStr};

use hmac::{Hmac, Mac, digest::KeyInit};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_256};

use crate::error::ConfigurationError;

/// Hash functions a store may be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
    Sha512_256,
}

impl HashAlgorithm {
    /// Every algorithm name accepted by [`HashAlgorithm::from_str`].
    pub const SUPPORTED: &'static [HashAlgorithm] = &[
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha512_256,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha512_256 => "sha512/256",
        }
    }

    /// HMAC of `data` under `key`, as lowercase hex.
    pub fn hmac_hex(self, key: &[u8], data: &[u8]) -> String {
        let tag = match self {
            HashAlgorithm::Sha1 => mac::<Hmac<Sha1>>(key, data),
            HashAlgorithm::Sha224 => mac::<Hmac<Sha224>>(key, data),
            HashAlgorithm::Sha256 => mac::<Hmac<Sha256>>(key, data),
            HashAlgorithm::Sha384 => mac::<Hmac<Sha384>>(key, data),
            HashAlgorithm::Sha512 => mac::<Hmac<Sha512>>(key, data),
            HashAlgorithm::Sha512_256 => mac::<Hmac<Sha512_256>>(key, data),
        };
        hex::encode(tag)
    }
}

fn mac<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = <M as Mac>::new_from_slice(key).expect("HMAC accepts any key size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

impl FromStr for HashAlgorithm {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::SUPPORTED
            .iter()
            .copied()
            .find(|algorithm| {
                algorithm.name() == wanted || algorithm.name().replace('/', "-") == wanted
            })
            .ok_or_else(|| ConfigurationError::UnsupportedHashAlgorithm(s.to_string()))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registry_names() {
        for algorithm in HashAlgorithm::SUPPORTED {
            assert_eq!(
                algorithm.name().parse::<HashAlgorithm>(),
                Ok(*algorithm),
                "{algorithm} parses back"
            );
        }
        assert_eq!("SHA1".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha1));
        assert_eq!(
            "sha512-256".parse::<HashAlgorithm>(),
            Ok(HashAlgorithm::Sha512_256)
        );
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(
            "md4".parse::<HashAlgorithm>(),
            Err(ConfigurationError::UnsupportedHashAlgorithm("md4".into()))
        );
    }

    #[test]
    fn hmac_sha256_matches_rfc4231_case_2() {
        let tag = HashAlgorithm::Sha256.hmac_hex(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            tag,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn hmac_sha1_matches_rfc2202_case_2() {
        let tag = HashAlgorithm::Sha1.hmac_hex(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(tag, "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
    }

    #[test]
    fn output_length_follows_algorithm() {
        assert_eq!(HashAlgorithm::Sha1.hmac_hex(b"k", b"d").len(), 40);
        assert_eq!(HashAlgorithm::Sha512.hmac_hex(b"k", b"d").len(), 128);
        assert_eq!(HashAlgorithm::Sha512_256.hmac_hex(b"k", b"d").len(), 64);
    }
}
