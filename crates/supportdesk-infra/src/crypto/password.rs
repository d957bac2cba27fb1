//! Argon2id password hashing.
//!
//! Implements the `PasswordHasher` port from `supportdesk-core`. Hashes are
//! self-describing PHC strings (`$argon2id$v=19$...`) carrying their own salt
//! and parameters, so verification needs nothing but the stored string.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
};

use supportdesk_core::service::credential::PasswordHasher;
use supportdesk_types::error::AuthError;

/// Argon2id password hasher.
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Argon2id v19 with the crate's default cost parameters.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Argon2id v19 with explicit costs (memory in KiB, iterations, lanes).
    ///
    /// Hashes made with any parameters verify with any hasher, since the
    /// PHC string records them.
    pub fn with_params(m_cost_kib: u32, t_cost: u32, p_cost: u32) -> Result<Self, AuthError> {
        let params = Params::new(m_cost_kib, t_cost, p_cost, None)
            .map_err(|e| AuthError::Credential(format!("invalid Argon2 parameters: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Credential(format!("password hashing failed: {e}")))
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::Credential(format!("stored hash is not a PHC string: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Credential(format!(
                "password verification failed: {e}"
            ))),
        }
    }
}
