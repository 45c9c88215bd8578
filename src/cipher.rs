//! Encrypt adapters for the cookie payload.
//!
//! Only two adapters exist: a block cipher with an explicit initialization vector, and a
//! passphrase-keyed cipher. Both are deterministic once bound: binding the same key material and
//! encrypting the same plaintext yields the same ciphertext. Reads depend on that, because a
//! cookie is verified by rebuilding it from its decrypted contents and comparing the result.

use std::fmt;

use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use hkdf::Hkdf;
use serde::Deserialize;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CipherError;

const PASSPHRASE_KEY_INFO: &[u8] = b"sealed-auth-cookie/passphrase/key";
const PASSPHRASE_NONCE_INFO: &[u8] = b"sealed-auth-cookie/passphrase/nonce";
const CHACHA_KEY_LEN: usize = 32;
const CHACHA_NONCE_LEN: usize = 12;

/// The closed set of adapters a store accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptAdapter {
    BlockCipher(BlockCipherAdapter),
    Passphrase(PassphraseAdapter),
}

impl From<BlockCipherAdapter> for EncryptAdapter {
    fn from(adapter: BlockCipherAdapter) -> Self {
        EncryptAdapter::BlockCipher(adapter)
    }
}

impl From<PassphraseAdapter> for EncryptAdapter {
    fn from(adapter: PassphraseAdapter) -> Self {
        EncryptAdapter::Passphrase(adapter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum BlockCipherAlgorithm {
    #[serde(rename = "aes-128-cbc")]
    Aes128Cbc,
    #[default]
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
}

/// AES in CBC mode with PKCS#7 padding and a caller-supplied vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockCipherAdapter {
    algorithm: BlockCipherAlgorithm,
}

impl BlockCipherAdapter {
    pub fn new(algorithm: BlockCipherAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> BlockCipherAlgorithm {
        self.algorithm
    }

    pub fn key_size(&self) -> usize {
        match self.algorithm {
            BlockCipherAlgorithm::Aes128Cbc => 16,
            BlockCipherAlgorithm::Aes256Cbc => 32,
        }
    }

    pub fn iv_size(&self) -> usize {
        16
    }

    /// Binds `key` and `vector`, which must match [`key_size`](Self::key_size) and
    /// [`iv_size`](Self::iv_size).
    pub fn with_encryption(&self, key: &[u8], vector: &[u8]) -> Result<BoundCipher, CipherError> {
        if key.len() != self.key_size() || vector.len() != self.iv_size() {
            return Err(CipherError::InvalidKeyMaterial);
        }

        Ok(BoundCipher {
            inner: Bound::Block {
                algorithm: self.algorithm,
                key: Zeroizing::new(key.to_vec()),
                vector: vector.to_vec(),
            },
        })
    }
}

/// ChaCha20-Poly1305 keyed from a passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassphraseAdapter;

impl PassphraseAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn with_passphrase(&self, passphrase: &str) -> Result<BoundCipher, CipherError> {
        if passphrase.is_empty() {
            return Err(CipherError::InvalidKeyMaterial);
        }

        let mut key = Zeroizing::new([0u8; CHACHA_KEY_LEN]);
        let mut nonce = [0u8; CHACHA_NONCE_LEN];
        expand(passphrase.as_bytes(), PASSPHRASE_KEY_INFO, key.as_mut_slice())?;
        expand(passphrase.as_bytes(), PASSPHRASE_NONCE_INFO, &mut nonce)?;

        Ok(BoundCipher {
            inner: Bound::Passphrase { key, nonce },
        })
    }
}

/// HKDF-SHA256 expansion of `ikm` into `out`.
pub(crate) fn expand(ikm: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), CipherError> {
    Hkdf::<Sha256>::new(None, ikm)
        .expand(info, out)
        .map_err(|_| CipherError::InvalidKeyMaterial)
}

/// An adapter with key material bound for a single cookie.
pub struct BoundCipher {
    inner: Bound,
}

enum Bound {
    Block {
        algorithm: BlockCipherAlgorithm,
        key: Zeroizing<Vec<u8>>,
        vector: Vec<u8>,
    },
    Passphrase {
        key: Zeroizing<[u8; CHACHA_KEY_LEN]>,
        nonce: [u8; CHACHA_NONCE_LEN],
    },
}

impl BoundCipher {
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        match &self.inner {
            Bound::Block {
                algorithm: BlockCipherAlgorithm::Aes128Cbc,
                key,
                vector,
            } => Ok(cbc::Encryptor::<aes::Aes128>::new_from_slices(key, vector)
                .map_err(|_| CipherError::InvalidKeyMaterial)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
            Bound::Block {
                algorithm: BlockCipherAlgorithm::Aes256Cbc,
                key,
                vector,
            } => Ok(cbc::Encryptor::<aes::Aes256>::new_from_slices(key, vector)
                .map_err(|_| CipherError::InvalidKeyMaterial)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
            Bound::Passphrase { key, nonce } => {
                ChaCha20Poly1305::new(Key::from_slice(key.as_slice()))
                    .encrypt(Nonce::from_slice(nonce), plaintext)
                    .map_err(|_| CipherError::Encrypt)
            }
        }
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        match &self.inner {
            Bound::Block {
                algorithm: BlockCipherAlgorithm::Aes128Cbc,
                key,
                vector,
            } => cbc::Decryptor::<aes::Aes128>::new_from_slices(key, vector)
                .map_err(|_| CipherError::InvalidKeyMaterial)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| CipherError::Decrypt),
            Bound::Block {
                algorithm: BlockCipherAlgorithm::Aes256Cbc,
                key,
                vector,
            } => cbc::Decryptor::<aes::Aes256>::new_from_slices(key, vector)
                .map_err(|_| CipherError::InvalidKeyMaterial)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| CipherError::Decrypt),
            Bound::Passphrase { key, nonce } => {
                ChaCha20Poly1305::new(Key::from_slice(key.as_slice()))
                    .decrypt(Nonce::from_slice(nonce), ciphertext)
                    .map_err(|_| CipherError::Decrypt)
            }
        }
    }
}

impl fmt::Debug for BoundCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.inner {
            Bound::Block { algorithm, .. } => match algorithm {
                BlockCipherAlgorithm::Aes128Cbc => "aes-128-cbc",
                BlockCipherAlgorithm::Aes256Cbc => "aes-256-cbc",
            },
            Bound::Passphrase { .. } => "passphrase",
        };
        f.debug_struct("BoundCipher").field("kind", &kind).finish_non_exhaustive()
    }
}
