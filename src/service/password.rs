use crate::config::PasswordConfig;
use crate::error::app_error::AppError;
use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::OnceLock;
use tracing::warn;

/// One-way credential hashing: `hash` produces a salted digest, `verify` re-hashes and compares.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, AppError>;
    fn verify(&self, plaintext: &str, digest: &str) -> bool;

    /// Burn the same work as a real verification when there is nothing to verify against,
    /// so a missing account is not distinguishable by response time.
    fn dummy_verify(&self, plaintext: &str);
}

/// Argon2id hasher producing PHC strings.
pub struct Argon2Hasher {
    params: Params,
    dummy_hash: OnceLock<Option<String>>,
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn from_config(config: &PasswordConfig) -> Result<Self, AppError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AppError::PasswordHash {
                message: format!("Invalid Argon2 parameters: {e}"),
            })?;
        Ok(Self::new(params))
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AppError::password_hash("Failed to hash password", e))?;

        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };

        self.argon2().verify_password(plaintext.as_bytes(), &parsed).is_ok()
    }

    fn dummy_verify(&self, plaintext: &str) {
        let dummy = self.dummy_hash.get_or_init(|| self.hash("dummy-never-matches").ok());
        if let Some(dummy) = dummy {
            let _ = self.verify(plaintext, dummy);
        }
    }
}
