//! Authorization Code Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::authorization_code::AuthorizationCode;
use crate::shared::error::Result;

#[async_trait]
pub trait AuthorizationCodeRepository: Send + Sync {
    /// Store a freshly issued code. `Conflict` if the value already exists.
    async fn insert(&self, code: &AuthorizationCode) -> Result<()>;

    /// Atomically flip an unused code to used and return it as it was
    /// before the flip. `None` when the code is unknown or already used;
    /// at most one concurrent caller observes `Some`.
    async fn consume(&self, code: &str) -> Result<Option<AuthorizationCode>>;

    async fn find(&self, code: &str) -> Result<Option<AuthorizationCode>>;

    /// Remove every code already expired at `now`. Returns how many were removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
