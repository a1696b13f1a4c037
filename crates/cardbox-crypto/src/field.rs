//! Encrypted-vs-plaintext field handling for the migration window.
//!
//! Record fields written before encryption rolled out are stored as plain
//! text; newer writes are tokens. The token marker prefix is the
//! discriminator: anything else passes through untouched, while a
//! token-prefixed value that fails to decrypt surfaces its error instead
//! of being silently returned as text.

use crate::error::CryptoError;
use crate::token::{looks_like_token, TokenCipher};

/// A record field after the encrypted/plaintext split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Legacy value stored before encryption rolled out; returned as-is.
    Plain(String),
    /// Value recovered from an authenticated token.
    Decrypted(String),
}

impl FieldValue {
    /// The carried text, regardless of which side it came from.
    pub fn into_text(self) -> String {
        match self {
            FieldValue::Plain(text) | FieldValue::Decrypted(text) => text,
        }
    }
}

impl TokenCipher {
    /// Decrypt a stored field, passing legacy plaintext through unchanged.
    ///
    /// Unlike [`TokenCipher::decrypt`], this never errors on values that
    /// do not carry the token prefix. It does error on prefixed values
    /// that fail the pipeline, so real corruption is not masked as
    /// benign plaintext.
    pub fn decrypt_field(&self, value: &str) -> Result<FieldValue, CryptoError> {
        if !looks_like_token(value) {
            return Ok(FieldValue::Plain(value.to_owned()));
        }
        match self.decrypt(value) {
            Ok(text) => Ok(FieldValue::Decrypted(text)),
            Err(err) => {
                tracing::debug!(error = %err, "token-prefixed field failed to decrypt");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymmetricKey;

    fn cipher() -> TokenCipher {
        TokenCipher::new(&SymmetricKey::generate().unwrap())
    }

    #[test]
    fn plain_value_passes_through() {
        let got = cipher().decrypt_field("just a note").unwrap();
        assert_eq!(got, FieldValue::Plain("just a note".into()));
    }

    #[test]
    fn empty_value_passes_through() {
        let got = cipher().decrypt_field("").unwrap();
        assert_eq!(got, FieldValue::Plain(String::new()));
    }

    #[test]
    fn encrypted_value_is_decrypted() {
        let c = cipher();
        let token = c.encrypt("314").unwrap();
        assert_eq!(
            c.decrypt_field(&token).unwrap(),
            FieldValue::Decrypted("314".into())
        );
    }

    #[test]
    fn prefixed_garbage_is_an_error_not_plaintext() {
        let err = cipher().decrypt_field("gAAAAAgarbage").unwrap_err();
        assert!(matches!(err, CryptoError::TooShort | CryptoError::MalformedEncoding));
    }

    #[test]
    fn wrong_key_is_an_error_not_plaintext() {
        let token = cipher().encrypt("cvv").unwrap();
        let err = cipher().decrypt_field(&token).unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailed));
    }

    #[test]
    fn into_text_unwraps_both_sides() {
        assert_eq!(FieldValue::Plain("a".into()).into_text(), "a");
        assert_eq!(FieldValue::Decrypted("b".into()).into_text(), "b");
    }
}
