//! Authorization Code Repository (MongoDB)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Collection, Database,
};

use super::map_write_error;
use crate::auth::authorization_code::AuthorizationCode;
use crate::auth::authorization_code_repository::AuthorizationCodeRepository;
use crate::shared::error::Result;

pub const AUTHORIZATION_CODES_COLLECTION: &str = "authorization_codes";

pub struct MongoAuthorizationCodeRepository {
    collection: Collection<AuthorizationCode>,
}

impl MongoAuthorizationCodeRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(AUTHORIZATION_CODES_COLLECTION),
        }
    }
}

#[async_trait]
impl AuthorizationCodeRepository for MongoAuthorizationCodeRepository {
    async fn insert(&self, code: &AuthorizationCode) -> Result<()> {
        self.collection
            .insert_one(code)
            .await
            .map_err(|e| map_write_error(e, "AuthorizationCode", "code", "<redacted>"))?;
        Ok(())
    }

    async fn consume(&self, code: &str) -> Result<Option<AuthorizationCode>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let previous = self
            .collection
            .find_one_and_update(
                doc! { "_id": code, "used": false },
                doc! { "$set": { "used": true } },
            )
            .with_options(options)
            .await?;
        Ok(previous)
    }

    async fn find(&self, code: &str) -> Result<Option<AuthorizationCode>> {
        Ok(self.collection.find_one(doc! { "_id": code }).await?)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "expiresAt": { "$lte": now } })
            .await?;
        Ok(result.deleted_count)
    }
}
