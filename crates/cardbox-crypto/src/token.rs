//! Fernet-compatible authenticated token codec.
//!
//! Token layout (decoded):
//!
//! ```text
//! [version=0x80: 1B] [timestamp: 8B BE secs] [IV: 16B] [ciphertext: Nx16B] [HMAC-SHA256: 32B]
//! ```
//!
//! The tag covers everything before it. Encryption is AES-128-CBC with
//! PKCS#7 padding under the key's encryption half; the tag is HMAC-SHA256
//! under the signing half. The encoded form is URL-safe base64 with the
//! trailing `=` padding stripped, which makes every token start with
//! [`TOKEN_PREFIX`].

use aes::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut, KeyIvInit,
};
use aes::Aes128;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::base64url::{base64url_decode_padded, base64url_encode};
use crate::error::CryptoError;
use crate::types::{
    SymmetricKey, IV_LENGTH, MAX_CLOCK_SKEW, MIN_TOKEN_LENGTH, TAG_LENGTH, TOKEN_PREFIX,
    TOKEN_VERSION,
};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

const TIMESTAMP_OFFSET: usize = 1;
const IV_OFFSET: usize = TIMESTAMP_OFFSET + 8;
const CIPHERTEXT_OFFSET: usize = IV_OFFSET + IV_LENGTH;

/// Stateless codec over one [`SymmetricKey`].
///
/// Holds only the two key halves; safe to share across threads and cheap
/// to clone. Each call is a pure function of its inputs plus the CSPRNG
/// and clock on the encrypt side.
#[derive(Clone)]
pub struct TokenCipher {
    key: SymmetricKey,
}

impl TokenCipher {
    /// Create a codec over the given key.
    pub fn new(key: &SymmetricKey) -> Self {
        Self { key: key.clone() }
    }

    /// Encrypt `plaintext` into a fresh token.
    ///
    /// A new random IV and the current wall-clock second go into every
    /// token, so two calls with identical plaintext never produce the
    /// same output, while both decrypt back to it.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut iv = [0u8; IV_LENGTH];
        getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
        Ok(self.encrypt_parts(plaintext.as_bytes(), &iv, now_secs()))
    }

    /// Assemble a token from explicit parts. Interop test vectors pin the
    /// exact bytes this produces against the reference implementation.
    pub fn encrypt_parts(&self, plaintext: &[u8], iv: &[u8; IV_LENGTH], timestamp: u64) -> String {
        let ciphertext = Aes128CbcEnc::new(
            GenericArray::from_slice(self.key.encryption_key()),
            GenericArray::from_slice(iv),
        )
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut token = Vec::with_capacity(CIPHERTEXT_OFFSET + ciphertext.len() + TAG_LENGTH);
        token.push(TOKEN_VERSION);
        token.extend_from_slice(&timestamp.to_be_bytes());
        token.extend_from_slice(iv);
        token.extend_from_slice(&ciphertext);
        let tag = self.tag(&token);
        token.extend_from_slice(&tag);
        base64url_encode(&token)
    }

    /// Decrypt a token back to its plaintext.
    ///
    /// The tag is verified in constant time before any cipher work, so a
    /// forged token never reaches the padding check.
    pub fn decrypt(&self, token: &str) -> Result<String, CryptoError> {
        self.decrypt_at_time(token, None, now_secs())
    }

    /// Decrypt a token, rejecting any older than `ttl_secs`.
    pub fn decrypt_with_ttl(&self, token: &str, ttl_secs: u64) -> Result<String, CryptoError> {
        self.decrypt_at_time(token, Some(ttl_secs), now_secs())
    }

    /// Decrypt with an explicit clock, enforcing `ttl_secs` when given.
    ///
    /// A token timestamped more than [`MAX_CLOCK_SKEW`] seconds in the
    /// future is also rejected, matching the reference implementation.
    pub fn decrypt_at_time(
        &self,
        token: &str,
        ttl_secs: Option<u64>,
        now: u64,
    ) -> Result<String, CryptoError> {
        let data = base64url_decode_padded(token)?;
        let (timestamp, iv, ciphertext) = self.parse_and_verify(&data)?;

        if let Some(ttl) = ttl_secs {
            if now > timestamp.saturating_add(ttl) {
                return Err(CryptoError::TokenExpired);
            }
            if timestamp > now.saturating_add(MAX_CLOCK_SKEW) {
                return Err(CryptoError::TokenExpired);
            }
        }

        let plaintext = Aes128CbcDec::new(
            GenericArray::from_slice(self.key.encryption_key()),
            GenericArray::from_slice(iv),
        )
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::PaddingInvalid)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidText)
    }

    /// Read the creation timestamp of a token, verifying the tag first so
    /// an attacker cannot feed back a doctored timestamp.
    pub fn extract_timestamp(&self, token: &str) -> Result<u64, CryptoError> {
        let data = base64url_decode_padded(token)?;
        let (timestamp, _, _) = self.parse_and_verify(&data)?;
        Ok(timestamp)
    }

    /// Structural validation, field extraction, and tag verification.
    fn parse_and_verify<'a>(&self, data: &'a [u8]) -> Result<(u64, &'a [u8], &'a [u8]), CryptoError> {
        if data.len() < MIN_TOKEN_LENGTH {
            return Err(CryptoError::TooShort);
        }
        if data[0] != TOKEN_VERSION {
            return Err(CryptoError::UnsupportedVersion(data[0]));
        }

        let (signed, tag) = data.split_at(data.len() - TAG_LENGTH);
        self.verify_tag(signed, tag)?;

        let mut timestamp_bytes = [0u8; 8];
        timestamp_bytes.copy_from_slice(&signed[TIMESTAMP_OFFSET..IV_OFFSET]);
        let timestamp = u64::from_be_bytes(timestamp_bytes);
        let iv = &signed[IV_OFFSET..CIPHERTEXT_OFFSET];
        let ciphertext = &signed[CIPHERTEXT_OFFSET..];
        Ok((timestamp, iv, ciphertext))
    }

    fn tag(&self, data: &[u8]) -> [u8; TAG_LENGTH] {
        let mut mac = self.mac();
        mac.update(data);
        mac.finalize().into_bytes().into()
    }

    fn verify_tag(&self, data: &[u8], tag: &[u8]) -> Result<(), CryptoError> {
        let mut mac = self.mac();
        mac.update(data);
        // verify_slice compares in constant time
        mac.verify_slice(tag)
            .map_err(|_| CryptoError::AuthenticationFailed)
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length, so this cannot fail for the
        // fixed 16-byte signing half.
        HmacSha256::new_from_slice(self.key.signing_key())
            .expect("HMAC accepts any key length")
    }
}

/// Whether a string carries the token marker prefix.
pub fn looks_like_token(value: &str) -> bool {
    value.starts_with(TOKEN_PREFIX)
}

fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
