//! AES-256-GCM sealing for token values.
//!
//! Sealed layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! The session name is bound as associated data.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::RngCore;

use crate::error::{Result, TokenError};

/// Length of AES-256 key in bytes.
const KEY_LENGTH: usize = 32;

/// Length of GCM nonce in bytes.
const NONCE_LENGTH: usize = 12;

/// Length of GCM authentication tag in bytes.
const TAG_LENGTH: usize = 16;

#[derive(Clone)]
pub(crate) struct BlockCipher {
    cipher: Aes256Gcm,
}

impl BlockCipher {
    pub(crate) fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LENGTH {
            return Err(TokenError::InvalidBlockKey(key.len()));
        }
        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|_| TokenError::InvalidBlockKey(key.len()))?;
        Ok(Self { cipher })
    }

    pub(crate) fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| TokenError::Encryption)?;

        let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    pub(crate) fn open(&self, sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(TokenError::Decryption);
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LENGTH);

        self.cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| TokenError::Decryption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open() {
        let cipher = BlockCipher::new(&[3u8; 32]).unwrap();
        let sealed = cipher.seal(b"session-id", b"cart").unwrap();

        assert_eq!(sealed.len(), NONCE_LENGTH + 10 + TAG_LENGTH);
        assert_eq!(cipher.open(&sealed, b"cart").unwrap(), b"session-id");
    }

    #[test]
    fn test_open_rejects_other_aad() {
        let cipher = BlockCipher::new(&[3u8; 32]).unwrap();
        let sealed = cipher.seal(b"session-id", b"cart").unwrap();
        assert!(matches!(cipher.open(&sealed, b"auth"), Err(TokenError::Decryption)));
    }

    #[test]
    fn test_nonce_is_fresh() {
        let cipher = BlockCipher::new(&[3u8; 32]).unwrap();
        let a = cipher.seal(b"same", b"n").unwrap();
        let b = cipher.seal(b"same", b"n").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_short_key() {
        assert!(matches!(BlockCipher::new(&[0u8; 16]), Err(TokenError::InvalidBlockKey(16))));
    }

    #[test]
    fn test_open_rejects_truncated() {
        let cipher = BlockCipher::new(&[3u8; 32]).unwrap();
        assert!(matches!(cipher.open(&[0u8; 8], b"n"), Err(TokenError::Decryption)));
    }
}
