//! Development Data Seeder
//!
//! Registers a development user and one client per protocol. Existing
//! records are left untouched, so seeding on every start is harmless.
//!
//! Default credentials:
//!   dev@idp.local / DevPassword123!

use serde_json::json;
use tracing::info;

use crate::auth::auth_service::AuthService;
use crate::client::entity::{ClientType, NewClient};
use crate::client::service::ClientService;
use crate::shared::error::{IdpError, Result};

pub const DEV_USER_EMAIL: &str = "dev@idp.local";
pub const DEV_PASSWORD: &str = "DevPassword123!";

/// What a seeding run created.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub user_created: bool,
    pub clients_created: usize,
}

pub struct DevDataSeeder<'a> {
    auth: &'a AuthService,
    clients: &'a ClientService,
}

impl<'a> DevDataSeeder<'a> {
    pub fn new(auth: &'a AuthService, clients: &'a ClientService) -> Self {
        Self { auth, clients }
    }

    pub async fn seed(&self) -> Result<SeedReport> {
        info!("=== DEV DATA SEEDER ===");

        let report = SeedReport {
            user_created: self.seed_user().await?,
            clients_created: self.seed_clients().await?,
        };

        info!(
            user_created = report.user_created,
            clients_created = report.clients_created,
            "Development data seeded"
        );
        info!(email = DEV_USER_EMAIL, "Dev user login available");
        info!("=======================");
        Ok(report)
    }

    async fn seed_user(&self) -> Result<bool> {
        match self
            .auth
            .register(DEV_USER_EMAIL, DEV_PASSWORD, "Dev", "User")
            .await
        {
            Ok(_) => {
                info!("Created dev user: {}", DEV_USER_EMAIL);
                Ok(true)
            }
            Err(IdpError::Conflict { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn seed_clients(&self) -> Result<usize> {
        let mut created = 0;
        for client in dev_clients() {
            let client_id = client.client_id.clone();
            match self.clients.register(client).await {
                Ok(_) => {
                    info!("Created dev client: {}", client_id);
                    created += 1;
                }
                Err(IdpError::Conflict { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }
}

fn dev_clients() -> Vec<NewClient> {
    vec![
        NewClient::new("Dev SAML Service Provider", ClientType::Saml, "dev-saml-sp")
            .with_redirect_uri("http://localhost:8081/saml/acs")
            .with_scopes(["openid", "email"])
            .with_metadata("entityId", json!("http://localhost:8081/saml/metadata"))
            .with_metadata("logoutUrl", json!("http://localhost:8081/saml/logout")),
        NewClient::new("Dev OIDC Relying Party", ClientType::Oidc, "dev-oidc-rp")
            .with_secret("dev-oidc-secret")
            .with_redirect_uri("http://localhost:3000/callback")
            .with_scopes(["openid", "profile", "email"]),
        NewClient::new("Dev OAuth2 Client", ClientType::Oauth2, "dev-oauth2-client")
            .with_secret("dev-oauth2-secret")
            .with_redirect_uri("http://localhost:4000/oauth/callback")
            .with_scopes(["read", "write"]),
    ]
}
