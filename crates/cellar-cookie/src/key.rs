//! Key material.

use rand::RngCore;

/// One entry of the key ring: a hash key for signing and an optional block
/// key for encryption.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// HMAC-SHA256 key. Any non-empty length; 32 or 64 bytes recommended.
    pub hash_key: Vec<u8>,
    /// AES-256-GCM key (32 bytes). `None` leaves tokens signed but readable.
    pub block_key: Option<Vec<u8>>,
}

impl KeyPair {
    /// Create a signing-only key pair.
    pub fn new(hash_key: Vec<u8>) -> Self {
        Self {
            hash_key,
            block_key: None,
        }
    }

    /// Add an encryption key.
    pub fn with_block_key(mut self, block_key: Vec<u8>) -> Self {
        self.block_key = Some(block_key);
        self
    }

    /// Build key pairs from a flat list of keys: hash, block, hash, block, ...
    ///
    /// An empty block key (or a trailing hash key with no partner) means
    /// "no encryption" for that pair.
    pub fn from_slices(keys: &[&[u8]]) -> Vec<KeyPair> {
        keys.chunks(2)
            .map(|chunk| {
                let pair = KeyPair::new(chunk[0].to_vec());
                match chunk.get(1) {
                    Some(block) if !block.is_empty() => pair.with_block_key(block.to_vec()),
                    _ => pair,
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("hash_key", &"<redacted>")
            .field("block_key", &self.block_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Generate `len` random bytes from the thread-local CSPRNG.
///
/// Suitable for creating hash and block keys.
pub fn generate_random_key(len: usize) -> Vec<u8> {
    let mut key = vec![0u8; len];
    rand::rng().fill_bytes(&mut key);
    key
}
