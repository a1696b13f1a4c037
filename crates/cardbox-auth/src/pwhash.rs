//! Werkzeug-compatible PBKDF2 password hash verification.
//!
//! Record format: `pbkdf2:sha256:<iterations>$<salt>$<hex-digest>`. The
//! salt is literal UTF-8 text (never base64/hex decoded) and the digest
//! is the lowercase hex of PBKDF2-HMAC-SHA256(password, salt, iterations)
//! at the digest's natural 32-byte output length.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::AuthError;

/// Supported KDF family identifier.
const ALGORITHM: &str = "pbkdf2";

/// Supported pseudorandom function, fixed to the 256-bit digest.
const DIGEST_NAME: &str = "sha256";

/// Derived key length: SHA-256 output size.
const DERIVED_LENGTH: usize = 32;

/// Iteration count written by [`hash_password`]; matches the server-side
/// hasher's current default.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Salt length (characters) written by [`hash_password`].
const SALT_LENGTH: usize = 16;

const SALT_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Outcome of a password comparison. Distinct from [`AuthError`]: a
/// `NoMatch` means "wrong password", an error means "could not evaluate".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    NoMatch,
}

/// Compare a plaintext password against a stored hash record.
///
/// An absent (empty) record verifies as `NoMatch` rather than erroring,
/// so accounts without a hash simply never authenticate. Records naming
/// a non-PBKDF2 algorithm or a non-SHA-256 digest are reported as
/// [`AuthError::UnsupportedScheme`], which callers must not conflate
/// with a wrong password.
pub fn verify_password(password: &str, record: &str) -> Result<Verdict, AuthError> {
    if record.is_empty() {
        return Ok(Verdict::NoMatch);
    }

    let (method, salt, digest_hex) = split_record(record)?;
    let iterations = parse_method(method)?;
    let expected = hex::decode(digest_hex).map_err(|_| AuthError::MalformedRecord)?;

    let mut derived = [0u8; DERIVED_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut derived);

    // ct_eq requires equal lengths; a record with a truncated digest can
    // never match, it is not an error.
    let matches = expected.len() == DERIVED_LENGTH && bool::from(derived.ct_eq(&expected));
    derived.zeroize();

    Ok(if matches { Verdict::Match } else { Verdict::NoMatch })
}

/// Produce a hash record for `password` with [`DEFAULT_ITERATIONS`].
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_password_with(password, DEFAULT_ITERATIONS)
}

/// Produce a `pbkdf2:sha256:<iterations>$<salt>$<hex>` record with a
/// fresh random 16-character alphanumeric salt.
pub fn hash_password_with(password: &str, iterations: u32) -> Result<String, AuthError> {
    let salt = generate_salt()?;
    let mut derived = [0u8; DERIVED_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut derived);
    let record = format!(
        "{ALGORITHM}:{DIGEST_NAME}:{iterations}${salt}${}",
        hex::encode(derived)
    );
    derived.zeroize();
    Ok(record)
}

fn split_record(record: &str) -> Result<(&str, &str, &str), AuthError> {
    let mut parts = record.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(salt), Some(digest)) => Ok((method, salt, digest)),
        _ => Err(AuthError::MalformedRecord),
    }
}

/// Validate the `algorithm:digest:iterations` method segment and return
/// the iteration count.
fn parse_method(method: &str) -> Result<u32, AuthError> {
    let parts: Vec<&str> = method.split(':').collect();

    // A different KDF family (e.g. scrypt) is recognized but not
    // evaluable, regardless of how many parameters it carries.
    if parts.first().copied() != Some(ALGORITHM) {
        return Err(AuthError::UnsupportedScheme(method.to_owned()));
    }
    let [_, digest, iterations] = parts[..] else {
        return Err(AuthError::MalformedRecord);
    };
    if digest != DIGEST_NAME {
        return Err(AuthError::UnsupportedScheme(method.to_owned()));
    }
    match iterations.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AuthError::MalformedRecord),
    }
}

fn generate_salt() -> Result<String, AuthError> {
    let mut bytes = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut bytes).map_err(|e| AuthError::RngFailed(e.to_string()))?;
    Ok(bytes
        .iter()
        .map(|b| SALT_CHARS[(*b as usize) % SALT_CHARS.len()] as char)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Generated with werkzeug.security.generate_password_hash.
    const SECRET123_RECORD: &str =
        "pbkdf2:sha256:600000$fLoMivjsjXP0Y2wM$10826658041feeebe367d49d7ecf287fd1fa5a7c5fd017f2e8b61224d1212ce0";
    const HUNTER2_RECORD: &str =
        "pbkdf2:sha256:260000$q9XRgEE2$64c22adbbd3fe8b378510bf4722297d5343a5826982c76111b2acb7ad7b592fc";

    #[test]
    fn matches_reference_record() {
        assert_eq!(
            verify_password("secret123", SECRET123_RECORD).unwrap(),
            Verdict::Match
        );
    }

    #[test]
    fn matches_second_reference_record() {
        assert_eq!(
            verify_password("hunter2", HUNTER2_RECORD).unwrap(),
            Verdict::Match
        );
    }

    #[test]
    fn wrong_password_is_no_match() {
        assert_eq!(
            verify_password("wrong", SECRET123_RECORD).unwrap(),
            Verdict::NoMatch
        );
    }

    #[test]
    fn empty_record_is_no_match() {
        assert_eq!(verify_password("anything", "").unwrap(), Verdict::NoMatch);
    }

    #[test]
    fn uppercase_digest_still_matches() {
        let record = format!(
            "pbkdf2:sha256:600000$fLoMivjsjXP0Y2wM${}",
            "10826658041FEEEBE367D49D7ECF287FD1FA5A7C5FD017F2E8B61224D1212CE0"
        );
        assert_eq!(
            verify_password("secret123", &record).unwrap(),
            Verdict::Match
        );
    }

    #[test]
    fn standard_kdf_vectors() {
        // Published PBKDF2-HMAC-SHA256 vectors for password/salt.
        let cases = [
            (1, "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"),
            (2, "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"),
            (4096, "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"),
        ];
        for (iterations, digest) in cases {
            let record = format!("pbkdf2:sha256:{iterations}$salt${digest}");
            assert_eq!(
                verify_password("password", &record).unwrap(),
                Verdict::Match,
                "{iterations} iterations"
            );
        }
    }

    #[test]
    fn salt_is_literal_text_not_decoded() {
        // "salt" must be fed to the KDF as the four bytes s-a-l-t; if it
        // were hex/base64 decoded the standard vector could not match.
        let record =
            "pbkdf2:sha256:1$salt$120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b";
        assert_eq!(verify_password("password", record).unwrap(), Verdict::Match);
    }

    #[test]
    fn scrypt_is_unsupported_not_no_match() {
        let record = "scrypt:32768:8:1$q9XRgEE2$abcdef0123456789";
        let err = verify_password("secret123", record).unwrap_err();
        assert!(matches!(err, AuthError::UnsupportedScheme(m) if m.starts_with("scrypt")));
    }

    #[test]
    fn non_sha256_digest_is_unsupported() {
        let record = "pbkdf2:sha1:1000$salt$deadbeef";
        assert!(matches!(
            verify_password("x", record).unwrap_err(),
            AuthError::UnsupportedScheme(_)
        ));
    }

    #[test]
    fn single_segment_record_is_malformed() {
        assert!(matches!(
            verify_password("x", "onlyonepart").unwrap_err(),
            AuthError::MalformedRecord
        ));
    }

    #[test]
    fn method_without_iterations_is_malformed() {
        assert!(matches!(
            verify_password("x", "pbkdf2:sha256$salt$deadbeef").unwrap_err(),
            AuthError::MalformedRecord
        ));
    }

    #[test]
    fn non_numeric_iterations_is_malformed() {
        assert!(matches!(
            verify_password("x", "pbkdf2:sha256:lots$salt$deadbeef").unwrap_err(),
            AuthError::MalformedRecord
        ));
    }

    #[test]
    fn zero_iterations_is_malformed() {
        assert!(matches!(
            verify_password("x", "pbkdf2:sha256:0$salt$deadbeef").unwrap_err(),
            AuthError::MalformedRecord
        ));
    }

    #[test]
    fn non_hex_digest_is_malformed() {
        assert!(matches!(
            verify_password("x", "pbkdf2:sha256:1000$salt$nothex!").unwrap_err(),
            AuthError::MalformedRecord
        ));
    }

    #[test]
    fn truncated_digest_is_no_match() {
        // Valid hex but 4 bytes instead of 32.
        let record = "pbkdf2:sha256:1$salt$deadbeef";
        assert_eq!(verify_password("password", record).unwrap(), Verdict::NoMatch);
    }

    #[test]
    fn hash_then_verify_round_trip() {
        let record = hash_password_with("correct horse", 1000).unwrap();
        assert_eq!(
            verify_password("correct horse", &record).unwrap(),
            Verdict::Match
        );
        assert_eq!(
            verify_password("battery staple", &record).unwrap(),
            Verdict::NoMatch
        );
    }

    #[test]
    fn hash_record_shape() {
        let record = hash_password_with("pw", 1000).unwrap();
        let mut parts = record.splitn(3, '$');
        assert_eq!(parts.next(), Some("pbkdf2:sha256:1000"));
        let salt = parts.next().unwrap();
        assert_eq!(salt.len(), 16);
        assert!(salt.bytes().all(|b| b.is_ascii_alphanumeric()));
        let digest = parts.next().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    }

    #[test]
    fn salts_are_unique() {
        let a = hash_password_with("pw", 1000).unwrap();
        let b = hash_password_with("pw", 1000).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn default_iterations_match_server_hasher() {
        assert_eq!(DEFAULT_ITERATIONS, 600_000);
        let record = hash_password("pw").unwrap();
        assert!(record.starts_with("pbkdf2:sha256:600000$"));
    }
}
