//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "idp.toml",
    "config.toml",
    "./config/idp.toml",
    "./config/config.toml",
    "/etc/idp/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable
    /// overrides, then validate it.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match self.find_config_file() {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                AppConfig::from_file(&path)?
            }
            None => {
                info!("No configuration file found, using defaults");
                AppConfig::default()
            }
        };

        apply_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured file does not exist, searching defaults");
        }

        if let Ok(path) = env::var("IDP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

/// Apply `IDP_*` overrides using the given variable lookup.
///
/// Unparseable numeric or boolean values are ignored with a warning.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // MongoDB
    if let Some(val) = lookup("IDP_MONGODB_URI") {
        config.mongodb.uri = val;
    }
    if let Some(val) = lookup("IDP_MONGODB_DATABASE") {
        config.mongodb.database = val;
    }

    // Auth
    set_parsed(&lookup, "IDP_REVEAL_INACTIVE_ACCOUNTS", &mut config.auth.reveal_inactive_accounts);
    set_parsed(&lookup, "IDP_AUTH_CODE_TTL_SECS", &mut config.auth.authorization_code_ttl_secs);
    set_parsed(&lookup, "IDP_CLIENT_SECRET_BYTES", &mut config.auth.client_secret_bytes);
    set_parsed(&lookup, "IDP_PASSWORD_MIN_LENGTH", &mut config.auth.password.min_length);
    set_parsed(&lookup, "IDP_PASSWORD_MAX_LENGTH", &mut config.auth.password.max_length);
    set_parsed(&lookup, "IDP_ARGON2_MEMORY_COST", &mut config.auth.argon2.memory_cost);
    set_parsed(&lookup, "IDP_ARGON2_TIME_COST", &mut config.auth.argon2.time_cost);
    set_parsed(&lookup, "IDP_ARGON2_PARALLELISM", &mut config.auth.argon2.parallelism);

    // Pagination
    set_parsed(&lookup, "IDP_PAGINATION_DEFAULT_LIMIT", &mut config.pagination.default_limit);
    set_parsed(&lookup, "IDP_PAGINATION_MAX_LIMIT", &mut config.pagination.max_limit);

    // General
    set_parsed(&lookup, "IDP_DEV_MODE", &mut config.dev_mode);
    set_parsed(&lookup, "IDP_SEED_DEV_DATA", &mut config.seed_dev_data);
}

fn set_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => warn!(key, value = %raw, "Ignoring unparseable environment override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_applied() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("IDP_MONGODB_URI", "mongodb://db:27017"),
                ("IDP_MONGODB_DATABASE", "tenant_a"),
                ("IDP_REVEAL_INACTIVE_ACCOUNTS", "false"),
                ("IDP_AUTH_CODE_TTL_SECS", "120"),
                ("IDP_PASSWORD_MIN_LENGTH", "10"),
                ("IDP_SEED_DEV_DATA", "true"),
            ]),
        );

        assert_eq!(config.mongodb.uri, "mongodb://db:27017");
        assert_eq!(config.mongodb.database, "tenant_a");
        assert!(!config.auth.reveal_inactive_accounts);
        assert_eq!(config.auth.authorization_code_ttl_secs, 120);
        assert_eq!(config.auth.password.min_length, 10);
        assert!(config.seed_dev_data);
    }

    #[test]
    fn test_invalid_override_is_ignored() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[("IDP_AUTH_CODE_TTL_SECS", "ten minutes")]),
        );
        assert_eq!(config.auth.authorization_code_ttl_secs, 600);
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "dev_mode = true\n\n[mongodb]\ndatabase = \"from_file\"\n"
        )
        .unwrap();

        let config = ConfigLoader::with_path(file.path()).load().unwrap();
        assert!(config.dev_mode);
    }
}
