//! Authorization code issuance and redemption.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use super::authorization_code::AuthorizationCode;
use super::authorization_code_repository::AuthorizationCodeRepository;
use crate::client::entity::Client;
use crate::shared::error::{IdpError, Result};
use crate::shared::token::{generate_token, DEFAULT_TOKEN_BYTES};
use crate::user::entity::User;

pub struct AuthorizationCodeService {
    codes: Arc<dyn AuthorizationCodeRepository>,
    ttl: Duration,
}

impl AuthorizationCodeService {
    pub fn new(codes: Arc<dyn AuthorizationCodeRepository>) -> Self {
        Self {
            codes,
            ttl: Duration::seconds(AuthorizationCode::DEFAULT_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issue a code for a client that already passed the authorization
    /// gate. Redirect URI and scopes are re-checked against the client.
    pub async fn issue(
        &self,
        client: &Client,
        user: &User,
        redirect_uri: &str,
        scopes: Vec<String>,
        nonce: Option<String>,
    ) -> Result<AuthorizationCode> {
        if !client.is_active() {
            return Err(IdpError::ClientInactive {
                client_id: client.client_id().to_string(),
            });
        }
        if !client.is_redirect_uri_allowed(redirect_uri) {
            return Err(IdpError::InvalidRedirectUri {
                redirect_uri: redirect_uri.to_string(),
            });
        }
        if let Some(scope) = scopes.iter().find(|s| !client.is_scope_allowed(s)) {
            return Err(IdpError::InvalidScope {
                scope: scope.clone(),
            });
        }
        if !user.is_active() {
            return Err(IdpError::AccountInactive);
        }

        let code = AuthorizationCode::new(
            generate_token(DEFAULT_TOKEN_BYTES),
            client.client_id(),
            user.id().as_str(),
            redirect_uri,
        )
        .with_scopes(scopes)
        .with_nonce(nonce)
        .with_ttl(self.ttl);

        self.codes.insert(&code).await?;

        debug!(client_id = %client.client_id(), user_id = %user.id(), "Authorization code issued");
        Ok(code)
    }

    /// Redeem a code exactly once.
    ///
    /// The code is consumed before any other check, so a failed redemption
    /// still burns it.
    pub async fn redeem(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
    ) -> Result<AuthorizationCode> {
        let mut stored = match self.codes.consume(code).await? {
            Some(stored) => stored,
            None => {
                warn!(client_id, "Redemption of unknown or already used authorization code");
                return Err(IdpError::invalid_grant("Authorization code is invalid or already used"));
            }
        };

        if stored.is_expired_at(Utc::now()) {
            return Err(IdpError::invalid_grant("Authorization code has expired"));
        }
        if stored.client_id != client_id {
            warn!(client_id, issued_to = %stored.client_id, "Authorization code presented by another client");
            return Err(IdpError::invalid_grant("Authorization code was issued to another client"));
        }
        if stored.redirect_uri != redirect_uri {
            return Err(IdpError::invalid_grant("Redirect URI does not match the authorization request"));
        }

        stored.mark_used();
        info!(client_id, user_id = %stored.user_id, "Authorization code redeemed");
        Ok(stored)
    }

    /// Remove expired codes. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let removed = self.codes.delete_expired(Utc::now()).await?;
        if removed > 0 {
            debug!(removed, "Purged expired authorization codes");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::entity::{ClientType, NewClient};
    use crate::shared::email::Email;
    use crate::store::memory::InMemoryAuthorizationCodeRepository;

    fn client() -> Client {
        Client::new(
            NewClient::new("Portal", ClientType::Oidc, "portal")
                .with_redirect_uri("https://a/cb")
                .with_scopes(["openid", "profile"]),
        )
        .unwrap()
    }

    fn user() -> User {
        User::new(Email::parse("u@example.com").unwrap(), "U", "Ser").unwrap()
    }

    fn service() -> AuthorizationCodeService {
        AuthorizationCodeService::new(Arc::new(InMemoryAuthorizationCodeRepository::new()))
    }

    #[tokio::test]
    async fn test_issue_and_redeem_once() {
        let service = service();
        let (client, user) = (client(), user());
        let issued = service
            .issue(&client, &user, "https://a/cb", vec!["openid".into()], Some("n-1".into()))
            .await
            .unwrap();
        assert_eq!(issued.code.len(), 43);

        let redeemed = service.redeem(&issued.code, "portal", "https://a/cb").await.unwrap();
        assert_eq!(redeemed.user_id, user.id().as_str());
        assert_eq!(redeemed.scopes, vec!["openid".to_string()]);
        assert_eq!(redeemed.nonce.as_deref(), Some("n-1"));

        let again = service.redeem(&issued.code, "portal", "https://a/cb").await.unwrap_err();
        assert!(matches!(again, IdpError::InvalidGrant { .. }));
    }

    #[tokio::test]
    async fn test_issue_rechecks_client_policy() {
        let service = service();
        let (client, user) = (client(), user());

        let err = service
            .issue(&client, &user, "https://a/other", vec![], None)
            .await
            .unwrap_err();
        assert!(matches!(err, IdpError::InvalidRedirectUri { .. }));

        let err = service
            .issue(&client, &user, "https://a/cb", vec!["admin".into()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, IdpError::InvalidScope { .. }));
    }

    #[tokio::test]
    async fn test_redeem_rejections() {
        let service = service();
        let (client, user) = (client(), user());

        assert!(matches!(
            service.redeem("unknown", "portal", "https://a/cb").await.unwrap_err(),
            IdpError::InvalidGrant { .. }
        ));

        let code = service.issue(&client, &user, "https://a/cb", vec![], None).await.unwrap();
        assert!(matches!(
            service.redeem(&code.code, "intruder", "https://a/cb").await.unwrap_err(),
            IdpError::InvalidGrant { .. }
        ));
        // Burned by the failed attempt.
        assert!(service.redeem(&code.code, "portal", "https://a/cb").await.is_err());

        let code = service.issue(&client, &user, "https://a/cb", vec![], None).await.unwrap();
        assert!(service.redeem(&code.code, "portal", "https://a/cb/").await.is_err());
    }

    #[tokio::test]
    async fn test_expired_code_rejected_and_purged() {
        let service = service().with_ttl(Duration::seconds(-1));
        let code = service
            .issue(&client(), &user(), "https://a/cb", vec![], None)
            .await
            .unwrap();

        let err = service.redeem(&code.code, "portal", "https://a/cb").await.unwrap_err();
        assert!(err.to_string().contains("expired"));
        assert_eq!(service.purge_expired().await.unwrap(), 1);
    }
}
