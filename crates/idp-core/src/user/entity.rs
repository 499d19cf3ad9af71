//! User Aggregate
//!
//! Account identity, credential, profile and activation / verification
//! state. The credential is an opaque one-way hash that never leaves the
//! aggregate except through [`UserRecord`] for persistence.

use std::fmt;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::password_service::PasswordHasher;
use crate::shared::email::Email;
use crate::shared::entity::{Entity, EntityMeta};
use crate::shared::error::{IdpError, Result};
use crate::shared::tsid::EntityId;

pub const NAME_MAX_LENGTH: usize = 255;

/// Trim a name and check it is 1..=255 characters.
pub(crate) fn validate_name(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdpError::required(field));
    }
    if trimmed.chars().count() > NAME_MAX_LENGTH {
        return Err(IdpError::out_of_range(
            field,
            format!("{} must be at most {} characters", field, NAME_MAX_LENGTH),
        ));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone)]
pub struct User {
    meta: EntityMeta,
    email: Email,
    password_hash: String,
    first_name: String,
    last_name: String,
    active: bool,
    email_verified: bool,
    last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// New active, unverified user without a credential.
    pub fn new(email: Email, first_name: &str, last_name: &str) -> Result<Self> {
        Self::with_id(EntityId::generate(), email, first_name, last_name)
    }

    pub fn with_id(id: EntityId, email: Email, first_name: &str, last_name: &str) -> Result<Self> {
        Ok(Self {
            meta: EntityMeta::with_id(id),
            email,
            password_hash: String::new(),
            first_name: validate_name("firstName", first_name)?,
            last_name: validate_name("lastName", last_name)?,
            active: true,
            email_verified: false,
            last_login_at: None,
        })
    }

    /// Reconstitute a user from its storage record.
    pub fn restore(record: UserRecord) -> Result<Self> {
        Ok(Self {
            meta: EntityMeta::restore(record.id.into(), record.created_at, record.updated_at),
            email: Email::parse(&record.email)?,
            password_hash: record.password_hash,
            first_name: record.first_name,
            last_name: record.last_name,
            active: record.active,
            email_verified: record.email_verified,
            last_login_at: record.last_login_at,
        })
    }

    pub fn id(&self) -> &EntityId {
        self.meta.id()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.meta.updated_at()
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    pub fn has_password(&self) -> bool {
        !self.password_hash.is_empty()
    }

    /// Replace the credential with the hash of `plain`. The previous
    /// credential is discarded.
    pub fn set_password(&mut self, plain: &str, hasher: &dyn PasswordHasher) -> Result<()> {
        self.password_hash = hasher.hash(plain)?;
        self.meta.touch();
        Ok(())
    }

    /// Never fails: hashing errors are logged and count as a mismatch.
    pub fn verify_password(&self, plain: &str, hasher: &dyn PasswordHasher) -> bool {
        if self.password_hash.is_empty() {
            return false;
        }
        match hasher.verify(plain, &self.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(user_id = %self.id(), error = %e, "Password verification failed with error");
                false
            }
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.meta.touch();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.meta.touch();
    }

    /// One-way: there is no way to unverify an email.
    pub fn verify_email(&mut self) {
        self.email_verified = true;
        self.meta.touch();
    }

    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.meta.touch();
    }

    /// Replace both names. Neither changes unless both are valid.
    pub fn update_profile(&mut self, first_name: &str, last_name: &str) -> Result<()> {
        let first = validate_name("firstName", first_name)?;
        let last = validate_name("lastName", last_name)?;
        self.first_name = first;
        self.last_name = last;
        self.meta.touch();
        Ok(())
    }

    pub fn to_view(&self) -> UserView {
        UserView::from(self)
    }

    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            id: self.id().to_string(),
            email: self.email.to_string(),
            password_hash: self.password_hash.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            active: self.active,
            email_verified: self.email_verified,
            last_login_at: self.last_login_at,
            created_at: self.created_at(),
            updated_at: self.updated_at(),
        }
    }
}

impl Entity for User {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for User {}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", self.id())
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("active", &self.active)
            .field("email_verified", &self.email_verified)
            .field("last_login_at", &self.last_login_at)
            .finish()
    }
}

/// Storage shape of a user. Includes the credential hash.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional"
    )]
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("active", &self.active)
            .field("email_verified", &self.email_verified)
            .finish()
    }
}

/// Read model of a user. Never carries the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub active: bool,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            active: user.active,
            email_verified: user.email_verified,
            last_login_at: user.last_login_at,
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}
