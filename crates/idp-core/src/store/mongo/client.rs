//! Client Repository (MongoDB)

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::ReplaceOptions, Collection, Database};

use super::map_write_error;
use crate::client::entity::{Client, ClientRecord, ClientType};
use crate::client::repository::ClientRepository;
use crate::shared::error::Result;
use crate::shared::pagination::{Page, PageRequest};

pub const CLIENTS_COLLECTION: &str = "clients";

pub struct MongoClientRepository {
    collection: Collection<ClientRecord>,
}

impl MongoClientRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(CLIENTS_COLLECTION),
        }
    }
}

#[async_trait]
impl ClientRepository for MongoClientRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Client>> {
        Ok(self
            .collection
            .find_one(doc! { "_id": id })
            .await?
            .map(Client::restore))
    }

    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Client>> {
        Ok(self
            .collection
            .find_one(doc! { "clientId": client_id })
            .await?
            .map(Client::restore))
    }

    async fn find_by_type(&self, client_type: ClientType) -> Result<Vec<Client>> {
        let records: Vec<ClientRecord> = self
            .collection
            .find(doc! { "clientType": client_type.as_str() })
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(records.into_iter().map(Client::restore).collect())
    }

    async fn save(&self, client: &Client) -> Result<()> {
        let record = client.to_record();
        self.collection
            .replace_one(doc! { "_id": &record.id }, &record)
            .with_options(ReplaceOptions::builder().upsert(true).build())
            .await
            .map_err(|e| map_write_error(e, "Client", "clientId", &record.client_id))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Client>> {
        let total = self.collection.count_documents(doc! {}).await?;
        if page.is_empty() {
            return Ok(Page::new(Vec::new(), page, total));
        }

        let records: Vec<ClientRecord> = self
            .collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .skip(page.offset)
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;
        let clients = records.into_iter().map(Client::restore).collect();
        Ok(Page::new(clients, page, total))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
