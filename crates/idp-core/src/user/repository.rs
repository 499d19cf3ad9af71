//! User Repository
//!
//! Storage-agnostic persistence contract for [`User`] aggregates.

use async_trait::async_trait;

use super::entity::User;
use crate::shared::email::Email;
use crate::shared::error::Result;
use crate::shared::pagination::{Page, PageRequest};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Lookup by normalised email. [`Email`] is already lowercased.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>>;

    /// Idempotent upsert keyed by identifier.
    ///
    /// Fails with `Conflict` when another user already holds the email.
    /// Implementations must enforce this atomically in the store.
    async fn save(&self, user: &User) -> Result<()>;

    /// Returns `true` when a user was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Newest first.
    async fn find_all(&self, page: PageRequest) -> Result<Page<User>>;

    async fn count(&self) -> Result<u64>;
}
