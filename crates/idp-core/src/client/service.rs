//! Client administration.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::entity::{validate_secret, Client, ClientMetadata, ClientType, NewClient};
use super::repository::ClientRepository;
use crate::shared::error::{IdpError, Result};
use crate::shared::pagination::{Page, PageRequest};
use crate::shared::token::{generate_token, DEFAULT_TOKEN_BYTES};

/// Partial update; `None` fields are left unchanged. Each present field
/// replaces the attribute wholesale.
#[derive(Clone, Default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub redirect_uris: Option<Vec<String>>,
    pub allowed_scopes: Option<Vec<String>>,
    pub metadata: Option<ClientMetadata>,
    pub active: Option<bool>,
    pub client_secret: Option<String>,
}

impl fmt::Debug for ClientUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientUpdate")
            .field("name", &self.name)
            .field("redirect_uris", &self.redirect_uris)
            .field("allowed_scopes", &self.allowed_scopes)
            .field("metadata", &self.metadata)
            .field("active", &self.active)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

pub struct ClientService {
    clients: Arc<dyn ClientRepository>,
    secret_bytes: usize,
}

impl ClientService {
    pub fn new(clients: Arc<dyn ClientRepository>) -> Self {
        Self {
            clients,
            secret_bytes: DEFAULT_TOKEN_BYTES,
        }
    }

    /// Number of random bytes in secrets generated by `rotate_secret`.
    pub fn with_secret_bytes(mut self, secret_bytes: usize) -> Self {
        self.secret_bytes = secret_bytes;
        self
    }

    pub async fn register(&self, input: NewClient) -> Result<Client> {
        if self
            .clients
            .find_by_client_id(input.client_id.trim())
            .await?
            .is_some()
        {
            return Err(IdpError::conflict("Client", "clientId", input.client_id.trim()));
        }

        let client = Client::new(input)?;
        self.clients.save(&client).await?;

        info!(
            client_id = %client.client_id(),
            protocol = %client.client_type(),
            "Client registered"
        );
        Ok(client)
    }

    pub async fn get(&self, id: &str) -> Result<Client> {
        self.clients
            .find_by_id(id)
            .await?
            .ok_or_else(|| IdpError::not_found("Client", id))
    }

    pub async fn get_by_client_id(&self, client_id: &str) -> Result<Client> {
        self.clients
            .find_by_client_id(client_id)
            .await?
            .ok_or_else(|| IdpError::ClientNotFound {
                client_id: client_id.to_string(),
            })
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Client>> {
        self.clients.find_all(page).await
    }

    pub async fn list_by_type(&self, client_type: ClientType) -> Result<Vec<Client>> {
        self.clients.find_by_type(client_type).await
    }

    /// Apply every present field, then persist once. Nothing is saved if
    /// any field is invalid.
    pub async fn update(&self, id: &str, update: ClientUpdate) -> Result<Client> {
        let mut client = self.get(id).await?;

        if let Some(name) = update.name {
            client.update_name(&name)?;
        }
        if let Some(uris) = update.redirect_uris {
            client.update_redirect_uris(uris)?;
        }
        if let Some(scopes) = update.allowed_scopes {
            client.update_allowed_scopes(scopes)?;
        }
        if let Some(metadata) = update.metadata {
            client.update_metadata(metadata);
        }
        if let Some(secret) = update.client_secret {
            client.rotate_secret(validate_secret(&secret)?);
        }
        match update.active {
            Some(true) => client.activate(),
            Some(false) => client.deactivate(),
            None => {}
        }

        self.clients.save(&client).await?;
        info!(client_id = %client.client_id(), "Client updated");
        Ok(client)
    }

    /// Generate and store a new random secret. The plaintext is returned
    /// only here.
    pub async fn rotate_secret(&self, id: &str) -> Result<(Client, String)> {
        let mut client = self.get(id).await?;
        let secret = generate_token(self.secret_bytes);
        client.rotate_secret(secret.clone());
        self.clients.save(&client).await?;

        info!(client_id = %client.client_id(), "Client secret rotated");
        Ok((client, secret))
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<Client> {
        let mut client = self.get(id).await?;
        if active {
            client.activate();
        } else {
            client.deactivate();
        }
        self.clients.save(&client).await?;

        info!(client_id = %client.client_id(), active, "Client activation changed");
        Ok(client)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.clients.delete(id).await? {
            return Err(IdpError::not_found("Client", id));
        }
        info!(id, "Client deleted");
        Ok(())
    }
}
