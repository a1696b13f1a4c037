use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed password hash record")]
    MalformedRecord,

    #[error("Unsupported password hash scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
