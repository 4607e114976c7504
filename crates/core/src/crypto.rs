//! AES-256-GCM encryption for IP addresses stored at rest.
//!
//! Ciphertexts are encoded as `hex(nonce || ciphertext)` with a fresh
//! random 96-bit nonce per encryption, so the same address never produces
//! the same stored value twice.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;

use crate::error::CoreError;

/// AES-256-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Encrypts and decrypts IP addresses with a process-wide key.
#[derive(Clone)]
pub struct IpCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for IpCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpCipher").finish_non_exhaustive()
    }
}

impl IpCipher {
    /// Build a cipher from a 64-character hex-encoded 256-bit key.
    pub fn from_hex_key(hex_key: &str) -> Result<Self, CoreError> {
        let bytes = decode_hex(hex_key)
            .map_err(|e| CoreError::InvalidKey(format!("key is not valid hex: {e}")))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidKey("key must be 32 bytes (64 hex chars)".into()))?;
        Ok(Self { key })
    }

    /// Encrypt a plaintext value, returning `hex(nonce || ciphertext)`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CoreError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CoreError::Crypto("encryption failed".into()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(encode_hex(&out))
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, encoded: &str) -> Result<String, CoreError> {
        let bytes = decode_hex(encoded)
            .map_err(|e| CoreError::Crypto(format!("ciphertext is not valid hex: {e}")))?;
        if bytes.len() <= NONCE_LEN {
            return Err(CoreError::Crypto("ciphertext too short".into()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CoreError::Crypto("decryption failed".into()))?;

        String::from_utf8(plaintext)
            .map_err(|_| CoreError::Crypto("decrypted value is not UTF-8".into()))
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err("odd length".into());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| format!("invalid byte at {i}"))
        })
        .collect()
}
