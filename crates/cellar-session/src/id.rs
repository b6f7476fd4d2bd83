//! Session identifier generation.

use data_encoding::BASE32_NOPAD;
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::{Result, SessionError};

/// Random bytes behind every identifier.
pub const ID_BYTES: usize = 32;

/// Length of a generated identifier (unpadded base-32 of [`ID_BYTES`]).
pub const ID_LENGTH: usize = 52;

/// Generate a new session identifier.
///
/// 32 bytes from the operating system's CSPRNG, rendered as unpadded
/// base-32 (`A-Z`, `2-7`). If the OS source fails the error is returned;
/// there is no fallback to a weaker generator.
pub fn generate_id() -> Result<String> {
    let mut bytes = [0u8; ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::Entropy(e.to_string()))?;
    Ok(BASE32_NOPAD.encode(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_shape() {
        let id = generate_id().unwrap();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id().unwrap()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
