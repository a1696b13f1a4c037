use base64ct::{Base64UrlUnpadded, Encoding};

use crate::error::CryptoError;

/// Base64url encode bytes without padding.
pub fn base64url_encode(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

/// Base64url decode a string, tolerating trailing `=` padding.
///
/// Tokens are emitted unpadded, but the interoperating runtime keeps the
/// `=` padding on, so the decoder accepts both forms.
pub fn base64url_decode_padded(s: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = s.trim_end_matches('=');
    Base64UrlUnpadded::decode_vec(trimmed).map_err(|_| CryptoError::MalformedEncoding)
}
