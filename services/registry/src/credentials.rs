//! Credential hashing and verification
//!
//! Credentials are stored as lowercase SHA-256 hex digests. Profiles written
//! by older releases may still carry the plaintext secret; those are
//! recognised by shape and upgraded on the next successful login.

use sha2::{Digest, Sha256};

/// Length of a SHA-256 digest in hex
pub const DIGEST_HEX_LEN: usize = 64;

/// Outcome of checking a supplied secret against a stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Stored digest matches the supplied secret
    Match,
    /// Stored plaintext matches; the credential should be re-stored as a digest
    LegacyMatch,
    /// No match
    Mismatch,
}

/// Hash a secret into its stored form
pub fn hash_credential(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Check whether a stored value has the shape of a digest
///
/// A plaintext secret that happens to be 64 hex characters is
/// indistinguishable from a digest and will be treated as one.
pub fn looks_hashed(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Verify a supplied secret against a stored credential
pub fn verify_credential(stored: &str, supplied: &str) -> Verification {
    if looks_hashed(stored) {
        if hash_credential(supplied) == stored {
            Verification::Match
        } else {
            Verification::Mismatch
        }
    } else if stored == supplied {
        Verification::LegacyMatch
    } else {
        Verification::Mismatch
    }
}

/// Decide what to store when a profile update carries a credential
///
/// An unchanged credential is kept as-is. A changed one is hashed unless it
/// already has the shape of a digest.
pub fn normalize_credential(stored: &str, candidate: String) -> String {
    if candidate != stored && !looks_hashed(&candidate) {
        hash_credential(&candidate)
    } else {
        candidate
    }
}
