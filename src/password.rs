//! Password Hashing (IA-5)
//!
//! Argon2id hashing and verification for local credentials. The salt is
//! generated per hash and embedded in the PHC output string, so no separate
//! salt storage is needed.
//!
//! # Security Rationale
//!
//! Argon2 verification recomputes the full hash and compares digests, so the
//! time taken does not depend on where a mismatch occurs. A malformed stored
//! hash verifies as `false` rather than raising, which keeps the login path's
//! failure shape uniform.

use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use password_hash::{PasswordHash, SaltString};

/// A syntactically valid PHC string that matches no real password.
///
/// Login verifies against this when the email is unknown, so the work done on
/// an unknown identifier is comparable to a real verification.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$MDEyMzQ1Njc4OWFiY2RlZg$MDEyMzQ1Njc4OWFiY2RlZmdoaWprbG1ub3BxcnN0dXY";

/// Error type for hashing failures.
///
/// Verification never errors; only hashing can fail (salt generation or
/// backend failure).
#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

/// Argon2id password hasher.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a hasher with the library's recommended Argon2id parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a plaintext password into a PHC string with an embedded salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| HashError(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| HashError(e.to_string()))?;

        let phc = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError(e.to_string()))?
            .to_string();

        Ok(phc)
    }

    /// Verify a plaintext password against a stored PHC hash.
    ///
    /// Returns `false` on mismatch or malformed hash input.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        if let Ok(parsed) = PasswordHash::new(hash) {
            self.argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        } else {
            false
        }
    }

    /// Verify against a fixed dummy hash, discarding the result.
    ///
    /// Keeps the unknown-email login path doing comparable work to the
    /// wrong-password path.
    pub fn verify_dummy(&self, plaintext: &str) {
        let _ = self.verify(plaintext, DUMMY_HASH);
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}
