//! Client Authorization Gate
//!
//! The single ordered sequence of client checks every protocol front-end
//! (SAML, OIDC, OAuth2) applies before minting any artifact:
//!
//! 1. resolve the client by public identifier (`ClientNotFound`)
//! 2. protocol type matches the endpoint (`ClientTypeMismatch`)
//! 3. client is active (`ClientInactive`)
//! 4. redirect URI is registered, exact match (`InvalidRedirectUri`)
//! 5. every requested scope is allowed (`InvalidScope`, first offender)
//! 6. client secret matches when authentication is required
//!    (`InvalidClientSecret`)
//!
//! The first failing check wins; later checks are never evaluated.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::entity::{Client, ClientType};
use super::repository::ClientRepository;
use crate::shared::error::{IdpError, Result};

/// Inputs to the gate, as received by a protocol endpoint.
#[derive(Clone)]
pub struct AuthorizationRequest {
    pub client_id: String,
    /// Protocol of the endpoint being invoked.
    pub protocol: ClientType,
    /// `None` for back-channel calls that carry no redirect URI.
    pub redirect_uri: Option<String>,
    pub scopes: Vec<String>,
    pub client_secret: Option<String>,
    pub require_client_authentication: bool,
}

impl AuthorizationRequest {
    pub fn new(client_id: impl Into<String>, protocol: ClientType) -> Self {
        Self {
            client_id: client_id.into(),
            protocol,
            redirect_uri: None,
            scopes: Vec::new(),
            client_secret: None,
            require_client_authentication: false,
        }
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Supply a secret and require the client to authenticate with it.
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self.require_client_authentication = true;
        self
    }

    pub fn require_client_authentication(mut self, required: bool) -> Self {
        self.require_client_authentication = required;
        self
    }
}

impl std::fmt::Debug for AuthorizationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationRequest")
            .field("client_id", &self.client_id)
            .field("protocol", &self.protocol)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("require_client_authentication", &self.require_client_authentication)
            .finish()
    }
}

impl Client {
    /// Checks 2 to 6 of the gate against an already resolved client.
    pub fn check_authorization(&self, request: &AuthorizationRequest) -> Result<()> {
        if self.client_type() != request.protocol {
            return Err(IdpError::ClientTypeMismatch {
                client_id: self.client_id().to_string(),
                expected: request.protocol,
                actual: self.client_type(),
            });
        }

        if !self.is_active() {
            return Err(IdpError::ClientInactive {
                client_id: self.client_id().to_string(),
            });
        }

        if let Some(uri) = request.redirect_uri.as_deref() {
            if !self.is_redirect_uri_allowed(uri) {
                return Err(IdpError::InvalidRedirectUri {
                    redirect_uri: uri.to_string(),
                });
            }
        }

        if let Some(scope) = request.scopes.iter().find(|s| !self.is_scope_allowed(s)) {
            return Err(IdpError::InvalidScope {
                scope: scope.clone(),
            });
        }

        if request.require_client_authentication {
            if let Some(stored) = self.client_secret() {
                let supplied = request.client_secret.as_deref().unwrap_or("");
                if !secrets_match(stored, supplied) {
                    return Err(IdpError::InvalidClientSecret);
                }
            }
        }

        Ok(())
    }
}

/// Exact match, compared in constant time for equal-length inputs.
fn secrets_match(stored: &str, supplied: &str) -> bool {
    !supplied.is_empty() && bool::from(stored.as_bytes().ct_eq(supplied.as_bytes()))
}

/// The gate as a service: resolves the client and applies every check.
pub struct AuthorizationGate {
    clients: Arc<dyn ClientRepository>,
}

impl AuthorizationGate {
    pub fn new(clients: Arc<dyn ClientRepository>) -> Self {
        Self { clients }
    }

    /// Returns the validated client on success.
    pub async fn authorize(&self, request: &AuthorizationRequest) -> Result<Client> {
        let client = self
            .clients
            .find_by_client_id(&request.client_id)
            .await?
            .ok_or_else(|| IdpError::ClientNotFound {
                client_id: request.client_id.clone(),
            })?;

        if let Err(e) = client.check_authorization(request) {
            warn!(
                client_id = %request.client_id,
                protocol = %request.protocol,
                code = e.error_code(),
                "Authorization request rejected"
            );
            return Err(e);
        }

        debug!(client_id = %request.client_id, protocol = %request.protocol, "Authorization request accepted");
        Ok(client)
    }
}
