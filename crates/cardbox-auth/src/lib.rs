pub mod error;
pub mod pwhash;

pub use error::AuthError;
pub use pwhash::{hash_password, hash_password_with, verify_password, Verdict, DEFAULT_ITERATIONS};
