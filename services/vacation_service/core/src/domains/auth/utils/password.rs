//! Memory-hard password hashing and the password policy.
//!
//! Argon2id with parameters {t=2, m=64 MiB, p=4, salt 16, hash 32}. Hashing
//! is CPU-bound for hundreds of milliseconds; callers on the async runtime
//! must offload through `spawn_blocking`.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
    Algorithm, Argon2, Params, Version,
};
use shared_error::AppError;

const DEFAULT_TIME_COST: u32 = 2;
const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
const DEFAULT_PARALLELISM: u32 = 4;
const HASH_LENGTH: usize = 32;

const MIN_PASSWORD_LENGTH: usize = 12;
const SPECIAL_CHARS: &str = "!@#$%^&*()-_=+[]{};:'\",.<>/?\\|~";

/// Outcome of a successful verification.
#[derive(Debug, Clone, Copy)]
pub struct Verification {
    /// Stored parameters are weaker than current policy; the caller must
    /// rehash and re-persist after this successful login.
    pub needs_rehash: bool,
}

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    params: Params,
    /// Hash of an unguessable throwaway value, verified against when an
    /// email does not resolve to a user so response timing stays flat.
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::with_params(DEFAULT_TIME_COST, DEFAULT_MEMORY_KIB, DEFAULT_PARALLELISM)
            .expect("default Argon2 parameters are valid")
    }

    /// Caller-specified parameters (configuration, fast test profiles).
    pub fn with_params(
        time_cost: u32,
        memory_kib: u32,
        parallelism: u32,
    ) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, time_cost, parallelism, Some(HASH_LENGTH))
            .map_err(|e| AppError::ConfigError(format!("Invalid Argon2 parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"timing-equalizer", &salt)
            .map_err(|e| AppError::Internal(format!("Failed to prime hasher: {}", e)))?
            .to_string();

        Ok(Self {
            argon2,
            params,
            dummy_hash,
        })
    }

    /// Hash a password into a PHC-encoded string with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash.
    ///
    /// Mismatch fails `InvalidCredential`; unparsable stored input fails
    /// `StoredHashCorrupt`. On success the flag says whether the stored
    /// parameters have fallen behind current policy.
    pub fn verify(&self, encoded: &str, password: &str) -> Result<Verification, AppError> {
        let parsed = PasswordHash::new(encoded).map_err(|_| AppError::StoredHashCorrupt)?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => {},
            Err(argon2::password_hash::Error::Password) => return Err(AppError::InvalidCredential),
            Err(_) => return Err(AppError::StoredHashCorrupt),
        }

        let stored = Params::try_from(&parsed).map_err(|_| AppError::StoredHashCorrupt)?;
        let needs_rehash = stored.m_cost() < self.params.m_cost()
            || stored.t_cost() < self.params.t_cost()
            || stored.p_cost() < self.params.p_cost();

        Ok(Verification { needs_rehash })
    }

    /// Burn one verification against a throwaway hash. Called when the email
    /// does not resolve to a user, so failed lookups cost the same as failed
    /// verifications.
    pub fn dummy_verify(&self, password: &str) {
        if let Ok(parsed) = PasswordHash::new(&self.dummy_hash) {
            let _ = self.argon2.verify_password(password.as_bytes(), &parsed);
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a candidate password against policy. Enforced at set/change time,
/// never at verify time. Returns the first failing rule.
pub fn validate_password_policy(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::WeakPassword(format!(
            "must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::WeakPassword(
            "must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::WeakPassword(
            "must contain a lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::WeakPassword("must contain a digit".to_string()));
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(AppError::WeakPassword(
            "must contain a special character".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters so the suite stays fast; production parameters are
    /// covered by the needs_rehash comparison below.
    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_params(1, 8, 1).unwrap()
    }

    #[test]
    fn hash_then_verify_round_trip() {
        let hasher = fast_hasher();
        let encoded = hasher.hash("Str0ng!Passw0rd!").unwrap();

        let outcome = hasher.verify(&encoded, "Str0ng!Passw0rd!").unwrap();
        assert!(!outcome.needs_rehash);

        assert!(matches!(
            hasher.verify(&encoded, "wrong-password"),
            Err(AppError::InvalidCredential)
        ));
    }

    #[test]
    fn corrupt_stored_hash_is_flagged() {
        let hasher = fast_hasher();
        assert!(matches!(
            hasher.verify("not-a-phc-string", "whatever"),
            Err(AppError::StoredHashCorrupt)
        ));
    }

    #[test]
    fn weaker_stored_params_trigger_rehash() {
        let weak = PasswordHasher::with_params(1, 8, 1).unwrap();
        let strong = PasswordHasher::with_params(2, 16, 1).unwrap();

        let encoded = weak.hash("Str0ng!Passw0rd!").unwrap();
        let outcome = strong.verify(&encoded, "Str0ng!Passw0rd!").unwrap();
        assert!(outcome.needs_rehash);
    }

    #[test]
    fn policy_reports_first_failing_rule() {
        let cases = [
            ("Short1!", "at least 12"),
            ("alllowercase1!!!", "uppercase"),
            ("ALLUPPERCASE1!!!", "lowercase"),
            ("NoDigitsHere!!!!", "digit"),
            ("NoSpecials12345A", "special"),
        ];
        for (password, fragment) in cases {
            match validate_password_policy(password) {
                Err(AppError::WeakPassword(rule)) => {
                    assert!(
                        rule.contains(fragment),
                        "password {:?}: expected rule mentioning {:?}, got {:?}",
                        password,
                        fragment,
                        rule
                    );
                },
                other => panic!("password {:?}: expected WeakPassword, got {:?}", password, other),
            }
        }

        assert!(validate_password_policy("Str0ng!Passw0rd!").is_ok());
    }
}
