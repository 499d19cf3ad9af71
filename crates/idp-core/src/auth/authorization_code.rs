//! Authorization Code Domain Model
//!
//! Short-lived, single-use codes for the authorization code flow. A code
//! is bound to the client, user and redirect URI it was issued for.

use std::fmt;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCode {
    /// Code value, also the storage key.
    #[serde(rename = "_id")]
    pub code: String,

    /// Public identifier of the client the code was issued to.
    pub client_id: String,

    pub user_id: String,

    /// Must match exactly on redemption.
    pub redirect_uri: String,

    #[serde(default)]
    pub scopes: Vec<String>,

    /// OIDC nonce for replay protection.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nonce: Option<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,

    pub used: bool,
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationCode")
            .field("code", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("user_id", &self.user_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("expires_at", &self.expires_at)
            .field("used", &self.used)
            .finish()
    }
}

impl AuthorizationCode {
    pub const DEFAULT_TTL_SECS: i64 = 600;

    pub fn new(
        code: impl Into<String>,
        client_id: impl Into<String>,
        user_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            code: code.into(),
            client_id: client_id.into(),
            user_id: user_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
            nonce: None,
            created_at: now,
            expires_at: now + Duration::seconds(Self::DEFAULT_TTL_SECS),
            used: false,
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_nonce(mut self, nonce: Option<String>) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = self.created_at + ttl;
        self
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Not used and not expired.
    pub fn is_valid(&self) -> bool {
        !self.used && !self.is_expired()
    }

    pub fn mark_used(&mut self) {
        self.used = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> AuthorizationCode {
        AuthorizationCode::new("abc", "portal", "user-1", "https://a/cb")
    }

    #[test]
    fn test_new_code_is_valid_for_ten_minutes() {
        let code = code();
        assert!(code.is_valid());
        assert_eq!((code.expires_at - code.created_at).num_seconds(), 600);
    }

    #[test]
    fn test_mark_used() {
        let mut code = code();
        code.mark_used();
        assert!(!code.is_valid());
    }

    #[test]
    fn test_expiry() {
        let code = code().with_ttl(Duration::seconds(0));
        assert!(code.is_expired());
        assert!(!code.is_valid());

        let code = self::code().with_ttl(Duration::seconds(30));
        assert!(!code.is_expired_at(code.created_at + Duration::seconds(29)));
        assert!(code.is_expired_at(code.created_at + Duration::seconds(30)));
    }

    #[test]
    fn test_debug_hides_code_value() {
        let code = AuthorizationCode::new("live-code-value", "portal", "user-1", "https://a/cb");
        let rendered = format!("{:?}", code);
        assert!(!rendered.contains("live-code-value"));
        assert!(rendered.contains("portal"));
    }
}
