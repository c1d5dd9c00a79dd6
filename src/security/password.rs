use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub output_length: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost_kib: 19456,
            time_cost: 2,
            parallelism: 1,
            output_length: 32,
        }
    }
}

impl Argon2Config {
    /// Minimum cost parameters, only for tests.
    pub fn fast() -> Self {
        Self {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
            output_length: 32,
        }
    }
}

/// Argon2id hashing for stored credentials. Output is a PHC string that
/// carries its own salt and parameters.
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    /// Hash of a random throwaway password, verified against when the account
    /// is unknown so both login paths pay for one Argon2 run.
    decoy_hash: String,
}

impl CredentialHasher {
    pub fn new(config: Argon2Config) -> Result<Self> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            Some(config.output_length),
        )
        .map_err(|e| anyhow!("Invalid Argon2 parameters: {e}"))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy_salt = SaltString::generate(&mut OsRng);
        let decoy_hash = argon2
            .hash_password(decoy_salt.as_str().as_bytes(), &decoy_salt)
            .map_err(|e| anyhow!("Failed to prepare decoy hash: {e}"))?
            .to_string();

        Ok(Self { argon2, decoy_hash })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(Argon2Config::default())
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash password: {e}"))?;

        Ok(hash.to_string())
    }

    /// A stored hash that cannot be parsed counts as a mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is unreadable: {e}");
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Runs a full verification that always fails. Used when no stored hash
    /// exists for the account.
    pub fn verify_decoy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.decoy_hash);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(Argon2Config::fast()).expect("hasher")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("secret1").expect("Hash failed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret1", &hash));
        assert!(!hasher.verify("secret2", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        let first = hasher.hash("secret1").expect("hash");
        let second = hasher.hash("secret1").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        let hasher = hasher();
        assert!(!hasher.verify("secret1", "not-a-phc-string"));
        assert!(!hasher.verify("secret1", ""));
    }

    #[test]
    fn test_decoy_never_matches() {
        let hasher = hasher();
        assert!(hasher.decoy_hash.starts_with("$argon2id$"));
        assert!(!hasher.verify_decoy("secret1"));
        assert!(!hasher.verify_decoy(""));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = Argon2Config {
            memory_cost_kib: 1,
            ..Argon2Config::fast()
        };
        assert!(CredentialHasher::new(config).is_err());
    }
}
