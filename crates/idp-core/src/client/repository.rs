//! Client Repository

use async_trait::async_trait;

use super::entity::{Client, ClientType};
use crate::shared::error::Result;
use crate::shared::pagination::{Page, PageRequest};

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Client>>;

    /// Lookup by public client identifier (exact match).
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Client>>;

    async fn find_by_type(&self, client_type: ClientType) -> Result<Vec<Client>>;

    /// Idempotent upsert keyed by identifier. `Conflict` when another
    /// client already holds the public client identifier.
    async fn save(&self, client: &Client) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<bool>;

    /// Newest first.
    async fn find_all(&self, page: PageRequest) -> Result<Page<Client>>;

    async fn count(&self) -> Result<u64>;
}
