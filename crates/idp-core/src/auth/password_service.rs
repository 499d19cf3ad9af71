//! Credential Hashing
//!
//! The core depends on an injected one-way hash-and-verify capability.
//! [`Argon2PasswordHasher`] is the default Argon2id implementation.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::{debug, warn};

use crate::shared::error::{IdpError, Result};

/// One-way hash-and-verify primitive for user credentials.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into an opaque, self-describing string.
    fn hash(&self, plain: &str) -> Result<String>;

    /// Compare a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; never compares plaintext directly.
    fn verify(&self, plain: &str, hash: &str) -> Result<bool>;
}

/// Password policy configuration
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Minimum password length (characters)
    pub min_length: usize,
    /// Maximum password length (characters)
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
    /// Characters that satisfy `require_special`
    pub special_chars: String,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 12,
            max_length: 255,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
            special_chars: "!@#$%^&*()_+-=[]{}|;':\",./<>?`~".to_string(),
        }
    }
}

impl PasswordPolicy {
    /// Length bounds only: 8..=255 characters.
    pub fn lenient() -> Self {
        Self {
            min_length: 8,
            max_length: 255,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
            special_chars: String::new(),
        }
    }

    /// Check a candidate password.
    ///
    /// Length violations are `OutOfRange`; missing character classes are
    /// `InvalidFormat`. Both are reported on the `password` field.
    pub fn validate(&self, password: &str) -> Result<()> {
        let len = password.chars().count();
        if len < self.min_length || len > self.max_length {
            return Err(IdpError::out_of_range(
                "password",
                format!(
                    "Password must be between {} and {} characters",
                    self.min_length, self.max_length
                ),
            ));
        }

        let mut missing = Vec::new();
        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            missing.push("an uppercase letter");
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            missing.push("a lowercase letter");
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            missing.push("a digit");
        }
        if self.require_special && !password.chars().any(|c| self.special_chars.contains(c)) {
            missing.push("a special character");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(IdpError::invalid_format(
                "password",
                format!("Password must contain {}", missing.join(", ")),
            ))
        }
    }
}

/// Argon2id configuration
#[derive(Debug, Clone)]
pub struct Argon2Config {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Iterations (default: 3)
    pub time_cost: u32,
    /// Lanes (default: 4)
    pub parallelism: u32,
    /// Output hash length in bytes (default: 32)
    pub output_len: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

impl Argon2Config {
    /// Low memory config for tests.
    pub fn testing() -> Self {
        Self {
            memory_cost: 4096,
            time_cost: 1,
            parallelism: 1,
            output_len: 32,
        }
    }

    fn to_params(&self) -> Result<Params> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_len),
        )
        .map_err(|e| IdpError::internal(format!("Invalid Argon2 parameters: {}", e)))
    }
}

/// Argon2id-backed [`PasswordHasher`].
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new(config: Argon2Config) -> Result<Self> {
        let params = config.to_params()?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
        }
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plain: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| IdpError::internal(format!("Failed to hash password: {}", e)))?;

        debug!("Password hashed");
        Ok(hash.to_string())
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool> {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored password hash is not a valid PHC string");
                return Ok(false);
            }
        };

        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(IdpError::internal(format!(
                "Password verification error: {}",
                e
            ))),
        }
    }
}
