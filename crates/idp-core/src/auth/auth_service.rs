//! Authentication Service
//!
//! Registration, authentication and password change over a
//! [`UserRepository`]. Every mutating operation ends in exactly one
//! `save`, so a user is never left hashed-but-unpersisted.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use super::password_service::{PasswordHasher, PasswordPolicy};
use crate::shared::email::Email;
use crate::shared::error::{IdpError, Result};
use crate::user::entity::User;
use crate::user::repository::UserRepository;

#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// Surface `AccountInactive` from `authenticate`. When `false`, an
    /// inactive account is indistinguishable from an unknown user.
    pub reveal_inactive_accounts: bool,
    /// Applied to new passwords on register and change.
    pub password_policy: PasswordPolicy,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            reveal_inactive_accounts: true,
            password_policy: PasswordPolicy::lenient(),
        }
    }
}

/// Verified against on every failed lookup so that unknown, inactive and
/// wrong-password logins all pay one hash verification.
const DUMMY_PASSWORD: &str = "dummy-password-for-equal-timing";

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    config: AuthServiceConfig,
    dummy_hash: OnceLock<String>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self::with_config(users, hasher, AuthServiceConfig::default())
    }

    pub fn with_config(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            users,
            hasher,
            config,
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &AuthServiceConfig {
        &self.config
    }

    /// Register a new, unverified user.
    ///
    /// The lookup here is a fast path only; uniqueness is guaranteed by the
    /// repository's `save`, which also fails with `Conflict`.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        let email = Email::parse(email)?;

        if self.users.find_by_email(&email).await?.is_some() {
            debug!(email = %email, "Registration rejected: email already registered");
            return Err(IdpError::conflict("User", "email", email.as_str()));
        }

        self.config.password_policy.validate(password)?;

        let mut user = User::new(email, first_name, last_name)?;
        user.set_password(password, self.hasher.as_ref())?;
        self.users.save(&user).await?;

        info!(user_id = %user.id(), "User registered");
        Ok(user)
    }

    /// Authenticate by email and password.
    ///
    /// Unknown email and wrong password both yield `Ok(None)`. An inactive
    /// account yields `AccountInactive` before the password is checked,
    /// unless `reveal_inactive_accounts` is off.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let email = match Email::parse(email) {
            Ok(email) => email,
            Err(_) => {
                self.verify_dummy(password);
                return Ok(None);
            }
        };

        let mut user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                debug!("Authentication failed: unknown email");
                self.verify_dummy(password);
                return Ok(None);
            }
        };

        if !user.is_active() {
            warn!(user_id = %user.id(), "Authentication attempt on inactive account");
            if self.config.reveal_inactive_accounts {
                return Err(IdpError::AccountInactive);
            }
            self.verify_dummy(password);
            return Ok(None);
        }

        if !user.has_password() {
            debug!(user_id = %user.id(), "Authentication failed: no password set");
            self.verify_dummy(password);
            return Ok(None);
        }

        if !user.verify_password(password, self.hasher.as_ref()) {
            debug!(user_id = %user.id(), "Authentication failed: bad credential");
            return Ok(None);
        }

        user.record_login();
        self.users.save(&user).await?;

        info!(user_id = %user.id(), "User authenticated");
        Ok(Some(user))
    }

    /// Run one verification against a fixed hash, discarding the result.
    fn verify_dummy(&self, password: &str) {
        let hash = self.dummy_hash.get_or_init(|| match self.hasher.hash(DUMMY_PASSWORD) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(error = %e, "Failed to compute dummy password hash");
                String::new()
            }
        });
        let _ = self.hasher.verify(password, hash);
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| IdpError::not_found("User", user_id))?;

        if !user.verify_password(current_password, self.hasher.as_ref()) {
            warn!(user_id = %user.id(), "Password change rejected: current password mismatch");
            return Err(IdpError::InvalidCredential);
        }

        self.config.password_policy.validate(new_password)?;
        user.set_password(new_password, self.hasher.as_ref())?;
        self.users.save(&user).await?;

        info!(user_id = %user.id(), "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password_service::{Argon2Config, Argon2PasswordHasher};
    use crate::shared::error::ValidationKind;
    use crate::store::memory::InMemoryUserRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Plaintext-prefix hasher that counts `verify` calls.
    #[derive(Default)]
    struct CountingHasher {
        verifies: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, password: &str) -> Result<String> {
            Ok(format!("plain${password}"))
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool> {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            Ok(hash.strip_prefix("plain$") == Some(password))
        }
    }

    fn counting_service(
        config: AuthServiceConfig,
    ) -> (AuthService, Arc<InMemoryUserRepository>, Arc<CountingHasher>) {
        let repo = Arc::new(InMemoryUserRepository::new());
        let hasher = Arc::new(CountingHasher::default());
        let service = AuthService::with_config(repo.clone(), hasher.clone(), config);
        (service, repo, hasher)
    }

    fn service() -> (AuthService, Arc<InMemoryUserRepository>) {
        let repo = Arc::new(InMemoryUserRepository::new());
        let hasher = Arc::new(Argon2PasswordHasher::new(Argon2Config::testing()).unwrap());
        (AuthService::new(repo.clone(), hasher), repo)
    }

    #[tokio::test]
    async fn test_register_normalises_and_hashes() {
        let (service, repo) = service();
        let user = service
            .register(" Ada@Example.com ", "password123", "Ada", "Lovelace")
            .await
            .unwrap();

        assert_eq!(user.email().as_str(), "ada@example.com");
        assert!(!user.is_email_verified());
        assert!(user.has_password());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let (service, repo) = service();

        let err = service.register("", "password123", "A", "B").await.unwrap_err();
        assert!(matches!(err, IdpError::Validation { kind: ValidationKind::Required, .. }));

        let err = service
            .register("ada@example.com", "short", "A", "B")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IdpError::Validation { kind: ValidationKind::OutOfRange, ref field, .. } if field == "password"
        ));

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_authenticate_invalid_email_is_none() {
        let (service, _) = service();
        assert!(service.authenticate("not-an-email", "whatever").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hidden_inactive_account() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let hasher = Arc::new(Argon2PasswordHasher::new(Argon2Config::testing()).unwrap());
        let config = AuthServiceConfig {
            reveal_inactive_accounts: false,
            ..AuthServiceConfig::default()
        };
        let service = AuthService::with_config(repo.clone(), hasher, config);

        let mut user = service
            .register("quiet@example.com", "password123", "Q", "Uiet")
            .await
            .unwrap();
        user.deactivate();
        repo.save(&user).await.unwrap();

        let result = service.authenticate("quiet@example.com", "password123").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_change_password_policy_applies() {
        let (service, _) = service();
        let user = service
            .register("pol@example.com", "password123", "P", "Ol")
            .await
            .unwrap();

        let err = service
            .change_password(user.id().as_str(), "password123", "tiny")
            .await
            .unwrap_err();
        assert!(matches!(err, IdpError::Validation { .. }));
        assert!(service
            .authenticate("pol@example.com", "password123")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_failed_lookups_verify_once_like_wrong_password() {
        let (service, repo, hasher) = counting_service(AuthServiceConfig {
            reveal_inactive_accounts: false,
            ..AuthServiceConfig::default()
        });
        let mut dormant = service
            .register("dormant@example.com", "password123", "Dor", "Mant")
            .await
            .unwrap();
        dormant.deactivate();
        repo.save(&dormant).await.unwrap();
        service
            .register("known@example.com", "password123", "Kno", "Wn")
            .await
            .unwrap();

        for email in [
            "ghost@example.com",
            "not-an-email",
            "dormant@example.com",
            "known@example.com",
        ] {
            let before = hasher.verifies.load(Ordering::SeqCst);
            let result = service.authenticate(email, "wrong-password").await.unwrap();
            assert!(result.is_none(), "{email}");
            assert_eq!(hasher.verifies.load(Ordering::SeqCst) - before, 1, "{email}");
        }
    }

    #[tokio::test]
    async fn test_dummy_hash_rejects_its_own_password_for_unknown_user() {
        let (service, _, _) = counting_service(AuthServiceConfig::default());
        let result = service
            .authenticate("ghost@example.com", DUMMY_PASSWORD)
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
