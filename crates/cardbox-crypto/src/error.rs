use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Token is not valid URL-safe base64")]
    MalformedEncoding,

    #[error("Token too short")]
    TooShort,

    #[error("Unsupported token version: {0:#04x}")]
    UnsupportedVersion(u8),

    // AuthenticationFailed and PaddingInvalid share one message so that
    // callers (and anything they print) cannot be used as a decryption
    // oracle. Match on the variant internally when debugging.
    #[error("Cannot decrypt token")]
    AuthenticationFailed,

    #[error("Cannot decrypt token")]
    PaddingInvalid,

    #[error("Decrypted data is not valid UTF-8 text")]
    InvalidText,

    #[error("Token timestamp is outside the accepted window")]
    TokenExpired,

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
