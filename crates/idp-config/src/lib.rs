//! Identity Provider Configuration
//!
//! TOML-based configuration with environment variable override support.
//! Every section carries defaults so a missing file yields a usable
//! development configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mongodb: MongoConfig,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,

    /// Enable development mode
    pub dev_mode: bool,

    /// Seed a dev user and one client per protocol on startup
    pub seed_dev_data: bool,
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "idp".to_string(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub password: PasswordPolicyConfig,
    pub argon2: Argon2Settings,

    /// Surface a distinct "account inactive" failure on login. When false,
    /// inactive accounts look exactly like unknown users.
    pub reveal_inactive_accounts: bool,

    /// Authorization code lifetime
    pub authorization_code_ttl_secs: u64,

    /// Random bytes in a generated client secret
    pub client_secret_bytes: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password: PasswordPolicyConfig::default(),
            argon2: Argon2Settings::default(),
            reveal_inactive_accounts: true,
            authorization_code_ttl_secs: 600, // 10 minutes
            client_secret_bytes: 32,
        }
    }
}

/// Password policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicyConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 255,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        }
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Argon2Settings {
    /// Memory cost in KiB
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub output_len: usize,
}

impl Default for Argon2Settings {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

/// Listing limits for administrative queries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 500,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Reject values the services cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let password = &self.auth.password;
        if password.min_length == 0 {
            return Err(ConfigError::ValidationError(
                "auth.password.min_length must be at least 1".to_string(),
            ));
        }
        if password.min_length > password.max_length {
            return Err(ConfigError::ValidationError(format!(
                "auth.password.min_length ({}) exceeds max_length ({})",
                password.min_length, password.max_length
            )));
        }
        if self.auth.authorization_code_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "auth.authorization_code_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.client_secret_bytes < 16 {
            return Err(ConfigError::ValidationError(
                "auth.client_secret_bytes must be at least 16".to_string(),
            ));
        }
        if self.pagination.default_limit == 0
            || self.pagination.default_limit > self.pagination.max_limit
        {
            return Err(ConfigError::ValidationError(format!(
                "pagination.default_limit must be within 1..={}",
                self.pagination.max_limit
            )));
        }
        if self.mongodb.database.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "mongodb.database must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Identity provider configuration
# Environment variables (IDP_*) override these settings

dev_mode = false
seed_dev_data = false

[mongodb]
uri = "mongodb://localhost:27017"
database = "idp"

[auth]
reveal_inactive_accounts = true
authorization_code_ttl_secs = 600
client_secret_bytes = 32

[auth.password]
min_length = 8
max_length = 255
require_uppercase = false
require_lowercase = false
require_digit = false
require_special = false

[auth.argon2]
memory_cost = 65536
time_cost = 3
parallelism = 4
output_len = 32

[pagination]
default_limit = 50
max_limit = 500
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.auth.reveal_inactive_accounts);
        assert_eq!(config.auth.authorization_code_ttl_secs, 600);
        assert_eq!(config.pagination.default_limit, 50);
    }

    #[test]
    fn test_example_toml_parses() {
        let config = AppConfig::from_toml(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.mongodb.database, "idp");
        assert_eq!(config.auth.password.min_length, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [auth]
            reveal_inactive_accounts = false

            [auth.password]
            min_length = 12
            "#,
        )
        .unwrap();

        assert!(!config.auth.reveal_inactive_accounts);
        assert_eq!(config.auth.password.min_length, 12);
        assert_eq!(config.auth.password.max_length, 255);
        assert_eq!(config.auth.argon2.time_cost, 3);
        assert_eq!(config.mongodb.uri, "mongodb://localhost:27017");
    }

    #[test]
    fn test_validate_rejects_inverted_password_bounds() {
        let mut config = AppConfig::default();
        config.auth.password.min_length = 300;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_short_client_secrets() {
        let mut config = AppConfig::default();
        config.auth.client_secret_bytes = 8;
        assert!(config.validate().is_err());
    }
}
