//! AES-256-GCM encryption of will payloads.
//!
//! Encrypted format: `version (1 byte) || nonce (12 bytes) || ciphertext+tag`.
//!
//! Keys are per-will: either generated at random and handed to the owner, or
//! derived with Argon2id from an owner-held secret salted with the owner
//! address. There is no shared or built-in key.
//!
//! SECURITY: Error types never contain plaintext or key material.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::{ExposeSecret, SecretString};

use legacychain_core::service::cipher::{KEY_LEN, PayloadCipher, PayloadKey};
use legacychain_types::error::CipherError;

/// Current payload format version.
const FORMAT_VERSION: u8 = 0x01;

/// Nonce size for AES-256-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

/// Domain tag prefixed to the owner address to form the Argon2 salt.
const SALT_DOMAIN: &[u8] = b"legacychain-payload-v1:";

/// AES-256-GCM implementation of [`PayloadCipher`].
#[derive(Debug, Clone, Default)]
pub struct AesGcmPayloadCipher;

impl AesGcmPayloadCipher {
    pub fn new() -> Self {
        Self
    }

    fn cipher(key: &PayloadKey) -> Aes256Gcm {
        Aes256Gcm::new(key.as_bytes().into())
    }
}

impl PayloadCipher for AesGcmPayloadCipher {
    fn generate_key(&self) -> PayloadKey {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        PayloadKey::from_bytes(key)
    }

    /// Argon2id with OWASP parameters (19 MiB, 2 iterations, 1 lane).
    fn derive_key(&self, secret: &SecretString, owner: &str) -> Result<PayloadKey, CipherError> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(CipherError::InvalidKey("secret is empty".to_string()));
        }

        let params = Params::new(19456, 2, 1, Some(KEY_LEN))
            .map_err(|_| CipherError::KeyDerivationFailed)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut salt = Vec::with_capacity(SALT_DOMAIN.len() + owner.len());
        salt.extend_from_slice(SALT_DOMAIN);
        salt.extend_from_slice(owner.as_bytes());

        let mut key = [0u8; KEY_LEN];
        argon2
            .hash_password_into(secret.as_bytes(), &salt, &mut key)
            .map_err(|_| CipherError::KeyDerivationFailed)?;
        Ok(PayloadKey::from_bytes(key))
    }

    fn encrypt(&self, plaintext: &[u8], key: &PayloadKey) -> Result<Vec<u8>, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = Self::cipher(key)
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Truncated input and unknown versions are reported as
    /// `DecryptionFailed`, the same as a wrong key.
    fn decrypt(&self, data: &[u8], key: &PayloadKey) -> Result<Vec<u8>, CipherError> {
        let Some((&version, rest)) = data.split_first() else {
            return Err(CipherError::DecryptionFailed);
        };
        if version != FORMAT_VERSION || rest.len() < NONCE_SIZE {
            return Err(CipherError::DecryptionFailed);
        }

        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
        Self::cipher(key)
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::DecryptionFailed)
    }
}
