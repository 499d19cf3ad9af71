//! User Repository (MongoDB)

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::ReplaceOptions, Collection, Database};

use super::map_write_error;
use crate::shared::email::Email;
use crate::shared::error::Result;
use crate::shared::pagination::{Page, PageRequest};
use crate::user::entity::{User, UserRecord};
use crate::user::repository::UserRepository;

pub const USERS_COLLECTION: &str = "users";

pub struct MongoUserRepository {
    collection: Collection<UserRecord>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(USERS_COLLECTION),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.collection
            .find_one(doc! { "_id": id })
            .await?
            .map(User::restore)
            .transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>> {
        self.collection
            .find_one(doc! { "email": email.as_str() })
            .await?
            .map(User::restore)
            .transpose()
    }

    async fn save(&self, user: &User) -> Result<()> {
        let record = user.to_record();
        self.collection
            .replace_one(doc! { "_id": &record.id }, &record)
            .with_options(ReplaceOptions::builder().upsert(true).build())
            .await
            .map_err(|e| map_write_error(e, "User", "email", &record.email))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<User>> {
        let total = self.collection.count_documents(doc! {}).await?;
        if page.is_empty() {
            return Ok(Page::new(Vec::new(), page, total));
        }

        let records: Vec<UserRecord> = self
            .collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .skip(page.offset)
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;

        let users = records
            .into_iter()
            .map(User::restore)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(users, page, total))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
