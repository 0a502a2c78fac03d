//! Argon2 password hashing implementation.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use quill_core::ports::{AuthError, PasswordService};

/// Argon2id password service. Hashes are stored in PHC string format, so the
/// parameters used for a hash travel with it and verification ignores the
/// currently configured cost.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Argon2id with explicit cost parameters.
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Cost from `ARGON2_MEMORY_KIB` / `ARGON2_ITERATIONS` / `ARGON2_PARALLELISM`,
    /// falling back to the argon2 crate defaults.
    pub fn from_env() -> Result<Self, AuthError> {
        fn var(name: &str, default: u32) -> u32 {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        }

        Self::with_params(
            var("ARGON2_MEMORY_KIB", Params::DEFAULT_M_COST),
            var("ARGON2_ITERATIONS", Params::DEFAULT_T_COST),
            var("ARGON2_PARALLELISM", Params::DEFAULT_P_COST),
        )
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashingError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2PasswordService {
        Argon2PasswordService::with_params(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let service = cheap();

        let hash = service.hash("secret1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret1"));
        assert!(service.verify("secret1", &hash).unwrap());
        assert!(!service.verify("secret2", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let service = cheap();
        assert_ne!(service.hash("secret1").unwrap(), service.hash("secret1").unwrap());
    }

    #[test]
    fn test_verify_uses_parameters_embedded_in_hash() {
        let hash = cheap().hash("secret1").unwrap();
        assert!(Argon2PasswordService::new().verify("secret1", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let result = cheap().verify("secret1", "not-a-phc-string");
        assert!(matches!(result, Err(AuthError::HashingError(_))));
    }

    #[test]
    fn test_invalid_params() {
        assert!(Argon2PasswordService::with_params(1, 1, 1).is_err());
    }
}
