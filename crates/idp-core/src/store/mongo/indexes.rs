//! MongoDB Index Initialization
//!
//! Creates the indexes the adapters rely on. Safe to run on every start.

use std::time::Duration;

use mongodb::{bson::doc, options::IndexOptions, Database, IndexModel};
use tracing::info;

use super::authorization_code::AUTHORIZATION_CODES_COLLECTION;
use super::client::CLIENTS_COLLECTION;
use super::user::USERS_COLLECTION;

pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    create_user_indexes(db).await?;
    create_client_indexes(db).await?;
    create_authorization_code_indexes(db).await?;

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

async fn create_user_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let users = db.collection::<mongodb::bson::Document>(USERS_COLLECTION);

    // Normalised email is the natural key
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    users
        .create_index(IndexModel::builder().keys(doc! { "createdAt": -1 }).build())
        .await?;

    info!("Created indexes on {}", USERS_COLLECTION);
    Ok(())
}

async fn create_client_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let clients = db.collection::<mongodb::bson::Document>(CLIENTS_COLLECTION);

    clients
        .create_index(
            IndexModel::builder()
                .keys(doc! { "clientId": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    clients
        .create_index(
            IndexModel::builder()
                .keys(doc! { "clientType": 1, "createdAt": -1 })
                .build(),
        )
        .await?;

    info!("Created indexes on {}", CLIENTS_COLLECTION);
    Ok(())
}

async fn create_authorization_code_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let codes = db.collection::<mongodb::bson::Document>(AUTHORIZATION_CODES_COLLECTION);

    // Server-side expiry as a backstop to delete_expired
    codes
        .create_index(
            IndexModel::builder()
                .keys(doc! { "expiresAt": 1 })
                .options(
                    IndexOptions::builder()
                        .expire_after(Duration::from_secs(0))
                        .build(),
                )
                .build(),
        )
        .await?;

    info!("Created indexes on {}", AUTHORIZATION_CODES_COLLECTION);
    Ok(())
}
