//! Password hashing.
//!
//! Secrets are never stored or compared in the clear: registration derives
//! a salted argon2 hash and verification re-derives it from the supplied
//! password. The hasher name is persisted per account so the algorithm can
//! be rotated later without guessing what an old row was hashed with.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Name stored in the `hasher` column.
pub const HASHER_NAME: &str = "argon2";

pub fn generate_b64_salt() -> String {
    SaltString::generate(&mut OsRng).to_string()
}

pub fn hash(plain: &str, b64_salt: &str) -> Result<String> {
    let argon2 = Argon2::default();
    let salt = SaltString::from_b64(b64_salt).map_err(|err| anyhow!("{}", err))?;
    let hash_string = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|err| anyhow!("{}", err))?
        .to_string();
    Ok(hash_string)
}

pub fn verify(plain: &str, target_hash: &str) -> Result<bool> {
    let argon2 = Argon2::default();
    let password_hash = PasswordHash::new(target_hash).map_err(|err| anyhow!("{}", err))?;
    Ok(argon2
        .verify_password(plain.as_bytes(), &password_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_per_salt_and_verifies() {
        let salt = generate_b64_salt();
        let hash1 = hash("123mypw", &salt).unwrap();
        let hash2 = hash("123mypw", &salt).unwrap();
        assert_eq!(hash1, hash2);

        assert!(verify("123mypw", &hash1).unwrap());
        assert!(!verify("not the pw", &hash1).unwrap());
    }

    #[test]
    fn different_salts_give_different_hashes() {
        let hash1 = hash("123mypw", &generate_b64_salt()).unwrap();
        let hash2 = hash("123mypw", &generate_b64_salt()).unwrap();
        assert_ne!(hash1, hash2);
    }
}
