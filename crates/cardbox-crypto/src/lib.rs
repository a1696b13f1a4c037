pub mod base64url;
pub mod error;
pub mod field;
pub mod token;
pub mod types;

pub use base64url::{base64url_decode_padded, base64url_encode};
pub use error::CryptoError;
pub use field::FieldValue;
pub use token::{looks_like_token, TokenCipher};
pub use types::{
    SymmetricKey, IV_LENGTH, KEY_LENGTH, MIN_TOKEN_LENGTH, TAG_LENGTH, TOKEN_PREFIX, TOKEN_VERSION,
};
