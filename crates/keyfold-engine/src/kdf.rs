// SPDX-FileCopyrightText: 2026 Keyfold Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2 derivation of `key2` and its split into the two fragments.
//!
//! `key2` is 32 bytes. Bytes `[0, 30)` become the session code (60 hex
//! chars, durable device-side storage); bytes `[30, 32)` become the code, a
//! big-endian u16 rendered as a zero-padded 5-digit decimal for human
//! memory. [`Key2::from_fragments`] is the exact inverse of [`split`] for
//! every code value in `[0, 65535]`.

use std::num::NonZeroU32;

use keyfold_core::{KeyfoldError, SALT_LEN};
use ring::pbkdf2;
use zeroize::Zeroizing;

/// Length of `key2` in bytes.
pub const KEY2_LEN: usize = 32;

/// Length of the session-code fragment in bytes (60 hex chars encoded).
pub const SESSION_CODE_LEN: usize = 30;

/// Number of rendered digits in the code fragment.
pub const CODE_DIGITS: usize = 5;

/// A reconstructed or freshly derived `key2`, zeroed on drop.
///
/// Exists only inside a single operation's stack frame; never stored, never
/// logged.
pub struct Key2(Zeroizing<[u8; KEY2_LEN]>);

impl Key2 {
    /// Reassemble `key2` from its two fragments.
    ///
    /// Malformed fragments (bad hex, wrong length, non-decimal or
    /// out-of-range code) are an authentication failure, not a parse error:
    /// a caller holding the real fragments can always produce well-formed
    /// input, so anything else is equivalent to a wrong key.
    pub fn from_fragments(session_code: &str, code: &str) -> Result<Self, KeyfoldError> {
        let head = hex::decode(session_code).map_err(|_| KeyfoldError::InvalidKey2)?;
        if head.len() != SESSION_CODE_LEN {
            return Err(KeyfoldError::InvalidKey2);
        }

        if code.is_empty() || code.len() > CODE_DIGITS || !code.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(KeyfoldError::InvalidKey2);
        }
        let tail: u16 = code
            .parse::<u32>()
            .ok()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or(KeyfoldError::InvalidKey2)?;

        let mut bytes = Zeroizing::new([0u8; KEY2_LEN]);
        bytes[..SESSION_CODE_LEN].copy_from_slice(&head);
        bytes[SESSION_CODE_LEN..].copy_from_slice(&tail.to_be_bytes());
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; KEY2_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY2_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Key2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key2([redacted])")
    }
}

/// Derive `key2` from the master password via PBKDF2-HMAC-SHA256.
pub fn derive(
    master_password: &[u8],
    salt: &[u8; SALT_LEN],
    iterations: u32,
) -> Result<Key2, KeyfoldError> {
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| KeyfoldError::Config("kdf iterations must be at least 1".to_string()))?;

    let mut out = Zeroizing::new([0u8; KEY2_LEN]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        master_password,
        out.as_mut(),
    );
    Ok(Key2(out))
}

/// Split `key2` into `(session_code, code)`.
///
/// Values below 10000 render with leading zeros; values above 65535 cannot
/// occur since the tail is a u16.
pub fn split(key2: &Key2) -> (String, String) {
    let bytes = key2.as_bytes();
    let session_code = hex::encode(&bytes[..SESSION_CODE_LEN]);
    let tail = u16::from_be_bytes([bytes[SESSION_CODE_LEN], bytes[SESSION_CODE_LEN + 1]]);
    (session_code, format!("{tail:05}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key2_with_tail(tail: u16) -> Key2 {
        let mut bytes = [0x5Au8; KEY2_LEN];
        bytes[SESSION_CODE_LEN..].copy_from_slice(&tail.to_be_bytes());
        Key2::from_bytes(bytes)
    }

    #[test]
    fn split_reassemble_roundtrip_for_boundary_codes() {
        for tail in [0u16, 9999, 10000, 65535] {
            let key2 = key2_with_tail(tail);
            let (session_code, code) = split(&key2);

            assert_eq!(session_code.len(), 60);
            assert_eq!(code.len(), 5);

            let reassembled = Key2::from_fragments(&session_code, &code).unwrap();
            assert_eq!(reassembled.as_bytes(), key2.as_bytes());
        }
    }

    #[test]
    fn low_codes_render_with_leading_zeros() {
        let (_, code) = split(&key2_with_tail(42));
        assert_eq!(code, "00042");
        let (_, code) = split(&key2_with_tail(0));
        assert_eq!(code, "00000");
    }

    #[test]
    fn derive_is_deterministic_and_salt_sensitive() {
        let salt_a = [1u8; SALT_LEN];
        let salt_b = [2u8; SALT_LEN];

        let k1 = derive(b"correct horse", &salt_a, 1000).unwrap();
        let k2 = derive(b"correct horse", &salt_a, 1000).unwrap();
        let k3 = derive(b"correct horse", &salt_b, 1000).unwrap();
        let k4 = derive(b"wrong horse", &salt_a, 1000).unwrap();

        assert_eq!(k1.as_bytes(), k2.as_bytes());
        assert_ne!(k1.as_bytes(), k3.as_bytes());
        assert_ne!(k1.as_bytes(), k4.as_bytes());
    }

    #[test]
    fn derive_roundtrips_through_fragments() {
        let salt = [9u8; SALT_LEN];
        let key2 = derive(b"hunter2 master", &salt, 1000).unwrap();
        let (session_code, code) = split(&key2);

        let reassembled = Key2::from_fragments(&session_code, &code).unwrap();
        assert_eq!(reassembled.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn malformed_fragments_are_auth_failures() {
        let (session_code, code) = split(&key2_with_tail(7));

        // Bad hex.
        assert!(matches!(
            Key2::from_fragments("zz", &code),
            Err(KeyfoldError::InvalidKey2)
        ));
        // Truncated session code.
        assert!(matches!(
            Key2::from_fragments(&session_code[..58], &code),
            Err(KeyfoldError::InvalidKey2)
        ));
        // Out-of-range code.
        assert!(matches!(
            Key2::from_fragments(&session_code, "65536"),
            Err(KeyfoldError::InvalidKey2)
        ));
        // Non-decimal code.
        assert!(matches!(
            Key2::from_fragments(&session_code, "12a45"),
            Err(KeyfoldError::InvalidKey2)
        ));
        // Empty code.
        assert!(matches!(
            Key2::from_fragments(&session_code, ""),
            Err(KeyfoldError::InvalidKey2)
        ));
    }

    #[test]
    fn unpadded_code_still_parses() {
        // A client that strips leading zeros must still reassemble correctly.
        let key2 = key2_with_tail(42);
        let (session_code, _) = split(&key2);
        let reassembled = Key2::from_fragments(&session_code, "42").unwrap();
        assert_eq!(reassembled.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn key2_debug_is_redacted() {
        let key2 = key2_with_tail(1234);
        assert_eq!(format!("{key2:?}"), "Key2([redacted])");
    }
}
