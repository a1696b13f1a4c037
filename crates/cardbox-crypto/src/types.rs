use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::base64url::{base64url_decode_padded, base64url_encode};
use crate::error::CryptoError;

/// Token wire format version byte.
///
/// Format: [version=0x80:1B][timestamp:8B BE secs][IV:16B][ciphertext:Nx16B][HMAC-SHA256:32B]
/// The whole structure is URL-safe base64 encoded with `=` padding stripped.
pub const TOKEN_VERSION: u8 = 0x80;

/// The first six characters of every version-0x80 token under URL-safe
/// base64. Constant for any timestamp before year ~4100, so it doubles as
/// the encrypted-vs-plaintext field discriminator.
pub const TOKEN_PREFIX: &str = "gAAAAA";

/// CBC initialization vector length in bytes (one AES block).
pub const IV_LENGTH: usize = 16;

/// AES block length in bytes.
pub const BLOCK_LENGTH: usize = 16;

/// HMAC-SHA256 tag length in bytes.
pub const TAG_LENGTH: usize = 32;

/// Combined key length in bytes: 16-byte signing half + 16-byte encryption half.
pub const KEY_LENGTH: usize = 32;

/// Length of each key half in bytes.
pub const SUBKEY_LENGTH: usize = 16;

/// Structural minimum of a decoded token: version + timestamp + IV + tag,
/// with an empty ciphertext. Shorter inputs cannot hold all fixed fields.
pub const MIN_TOKEN_LENGTH: usize = 1 + 8 + IV_LENGTH + TAG_LENGTH;

/// Tolerated forward clock skew (seconds) when enforcing a TTL.
pub const MAX_CLOCK_SKEW: u64 = 60;

/// Process-wide symmetric key: 32 raw bytes, logically split into a
/// signing half (bytes 0..16, HMAC only) and an encryption half
/// (bytes 16..32, AES only).
///
/// Injected into [`crate::TokenCipher::new`] rather than read from a
/// global, so tests and key rotation tooling can hold several at once.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_LENGTH],
}

impl SymmetricKey {
    /// Create a key from 32 raw bytes.
    ///
    /// Any other length is a configuration error; the key is never
    /// truncated or padded to fit.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_LENGTH,
                got: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(bytes);
        Ok(Self { bytes: key })
    }

    /// Create a key from the URL-safe base64 form used in configuration
    /// (padded and unpadded forms are both accepted).
    pub fn from_base64url(encoded: &str) -> Result<Self, CryptoError> {
        let mut decoded = base64url_decode_padded(encoded)?;
        let key = Self::from_bytes(&decoded);
        decoded.zeroize();
        key
    }

    /// Generate a fresh random key from the OS CSPRNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut key = [0u8; KEY_LENGTH];
        getrandom::getrandom(&mut key).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
        Ok(Self { bytes: key })
    }

    /// URL-safe base64 form (unpadded), suitable for a config value.
    pub fn to_base64url(&self) -> String {
        base64url_encode(&self.bytes)
    }

    /// Signing half: bytes 0..16, used only for message authentication.
    pub(crate) fn signing_key(&self) -> &[u8] {
        &self.bytes[..SUBKEY_LENGTH]
    }

    /// Encryption half: bytes 16..32, used only for block-cipher operations.
    pub(crate) fn encryption_key(&self) -> &[u8] {
        &self.bytes[SUBKEY_LENGTH..]
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}
