//! Member credential generation and hashing.
//!
//! Generated secrets never touch the database. Only the Argon2id PHC string
//! produced by [`hash_secret`] is stored.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use zeroize::Zeroizing;

use crate::error::{LibraryError, Result};

/// Length of a generated secret, in characters.
pub const SECRET_LENGTH: usize = 10;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Largest multiple of the alphabet size that fits in a byte. Bytes at or
/// above it are discarded so every character is equally likely.
const REJECT_FROM: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

const SALT_BYTES: usize = 16;

fn random_bytes(buf: &mut [u8]) -> Result<()> {
    getrandom::getrandom(buf)
        .map_err(|e| LibraryError::Credential(format!("Failed to read OS randomness: {}", e)))
}

/// Generate a random alphanumeric secret of [`SECRET_LENGTH`] characters.
pub fn generate_secret() -> Result<Zeroizing<String>> {
    let mut secret = Zeroizing::new(String::with_capacity(SECRET_LENGTH));
    let mut pool = Zeroizing::new([0u8; 32]);

    while secret.len() < SECRET_LENGTH {
        random_bytes(&mut pool[..])?;
        for &byte in pool.iter() {
            if byte >= REJECT_FROM {
                continue;
            }
            secret.push(ALPHABET[usize::from(byte) % ALPHABET.len()] as char);
            if secret.len() == SECRET_LENGTH {
                break;
            }
        }
    }

    Ok(secret)
}

/// Hash a secret with Argon2id and a random salt, returning a PHC string.
pub fn hash_secret(secret: &str) -> Result<String> {
    if secret.is_empty() {
        return Err(LibraryError::Credential("Secret cannot be empty".to_string()));
    }

    let mut salt_bytes = [0u8; SALT_BYTES];
    random_bytes(&mut salt_bytes)?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| LibraryError::Credential(format!("Failed to encode salt: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| LibraryError::Credential(format!("Hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a secret against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch and an error only if the stored hash is
/// malformed.
pub fn verify_secret(secret: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| LibraryError::Credential(format!("Invalid stored hash: {}", e)))?;

    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(LibraryError::Credential(format!(
            "Verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_shape() {
        let secret = generate_secret().unwrap();
        assert_eq!(secret.len(), SECRET_LENGTH);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_secrets_differ() {
        let a = generate_secret().unwrap();
        let b = generate_secret().unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("s3cretValue").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("s3cretValue"));
        assert!(verify_secret("s3cretValue", &hash).unwrap());
        assert!(!verify_secret("wrong", &hash).unwrap());
    }

    #[test]
    fn test_same_secret_hashes_differently() {
        assert_ne!(hash_secret("abc").unwrap(), hash_secret("abc").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_secret("abc", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_reject_threshold() {
        assert_eq!(REJECT_FROM, 248);
    }
}
