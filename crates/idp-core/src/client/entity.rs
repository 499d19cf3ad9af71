//! Client Aggregate
//!
//! A registered relying party / service provider. The protocol type and
//! public client identifier are fixed at registration; everything else is
//! replaced wholesale through the `update_*` operations.

use std::collections::BTreeMap;
use std::fmt;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::entity::{Entity, EntityMeta};
use crate::shared::error::{IdpError, Result};
use crate::shared::tsid::EntityId;

pub const CLIENT_NAME_MAX_LENGTH: usize = 255;
pub const CLIENT_ID_MAX_LENGTH: usize = 255;
pub const CLIENT_SECRET_MIN_LENGTH: usize = 8;

/// Protocol-specific extension data, e.g. SAML entity / logout URLs.
pub type ClientMetadata = BTreeMap<String, serde_json::Value>;

/// Protocol a client is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Saml,
    Oidc,
    Oauth2,
}

impl ClientType {
    pub const ALL: [ClientType; 3] = [ClientType::Saml, ClientType::Oidc, ClientType::Oauth2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saml => "saml",
            Self::Oidc => "oidc",
            Self::Oauth2 => "oauth2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "saml" => Some(Self::Saml),
            "oidc" => Some(Self::Oidc),
            "oauth2" => Some(Self::Oauth2),
            _ => None,
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for registering a client.
#[derive(Clone)]
pub struct NewClient {
    pub name: String,
    pub client_type: ClientType,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uris: Vec<String>,
    pub allowed_scopes: Vec<String>,
    pub metadata: ClientMetadata,
}

impl NewClient {
    pub fn new(
        name: impl Into<String>,
        client_type: ClientType,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client_type,
            client_id: client_id.into(),
            client_secret: None,
            redirect_uris: Vec::new(),
            allowed_scopes: Vec::new(),
            metadata: ClientMetadata::new(),
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uris.push(uri.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[derive(Clone)]
pub struct Client {
    meta: EntityMeta,
    name: String,
    client_type: ClientType,
    client_id: String,
    client_secret: Option<String>,
    redirect_uris: Vec<String>,
    allowed_scopes: Vec<String>,
    metadata: ClientMetadata,
    active: bool,
}

impl Client {
    /// Register a new active client. All registration invariants are
    /// checked here.
    pub fn new(input: NewClient) -> Result<Self> {
        Self::with_id(EntityId::generate(), input)
    }

    pub fn with_id(id: EntityId, input: NewClient) -> Result<Self> {
        let client_id = validate_bounded("clientId", &input.client_id, CLIENT_ID_MAX_LENGTH)?;
        let name = validate_bounded("name", &input.name, CLIENT_NAME_MAX_LENGTH)?;
        let client_secret = match input.client_secret {
            Some(secret) => Some(validate_secret(&secret)?),
            None => None,
        };

        Ok(Self {
            meta: EntityMeta::with_id(id),
            name,
            client_type: input.client_type,
            client_id,
            client_secret,
            redirect_uris: validate_redirect_uris(input.redirect_uris)?,
            allowed_scopes: validate_scopes(input.allowed_scopes)?,
            metadata: input.metadata,
            active: true,
        })
    }

    /// Reconstitute a client from its storage record.
    pub fn restore(record: ClientRecord) -> Self {
        Self {
            meta: EntityMeta::restore(record.id.into(), record.created_at, record.updated_at),
            name: record.name,
            client_type: record.client_type,
            client_id: record.client_id,
            client_secret: record.client_secret,
            redirect_uris: record.redirect_uris,
            allowed_scopes: dedupe(record.allowed_scopes),
            metadata: record.metadata,
            active: record.active,
        }
    }

    pub fn id(&self) -> &EntityId {
        self.meta.id()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.meta.updated_at()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client_type(&self) -> ClientType {
        self.client_type
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn has_secret(&self) -> bool {
        self.client_secret.is_some()
    }

    pub fn redirect_uris(&self) -> &[String] {
        &self.redirect_uris
    }

    pub fn allowed_scopes(&self) -> &[String] {
        &self.allowed_scopes
    }

    pub fn metadata(&self) -> &ClientMetadata {
        &self.metadata
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Exact string membership. No trailing-slash, case or query
    /// normalisation.
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }

    pub fn is_scope_allowed(&self, scope: &str) -> bool {
        self.allowed_scopes.iter().any(|allowed| allowed == scope)
    }

    /// Overwrite the secret. The old secret is invalid immediately.
    pub fn rotate_secret(&mut self, new_secret: impl Into<String>) {
        self.client_secret = Some(new_secret.into());
        self.meta.touch();
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.meta.touch();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.meta.touch();
    }

    pub fn update_name(&mut self, name: &str) -> Result<()> {
        self.name = validate_bounded("name", name, CLIENT_NAME_MAX_LENGTH)?;
        self.meta.touch();
        Ok(())
    }

    pub fn update_redirect_uris(&mut self, uris: Vec<String>) -> Result<()> {
        self.redirect_uris = validate_redirect_uris(uris)?;
        self.meta.touch();
        Ok(())
    }

    pub fn update_allowed_scopes(&mut self, scopes: Vec<String>) -> Result<()> {
        self.allowed_scopes = validate_scopes(scopes)?;
        self.meta.touch();
        Ok(())
    }

    pub fn update_metadata(&mut self, metadata: ClientMetadata) {
        self.metadata = metadata;
        self.meta.touch();
    }

    pub fn to_view(&self) -> ClientView {
        ClientView::from(self)
    }

    pub fn to_record(&self) -> ClientRecord {
        ClientRecord {
            id: self.id().to_string(),
            name: self.name.clone(),
            client_type: self.client_type,
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uris: self.redirect_uris.clone(),
            allowed_scopes: self.allowed_scopes.clone(),
            metadata: self.metadata.clone(),
            active: self.active,
            created_at: self.created_at(),
            updated_at: self.updated_at(),
        }
    }
}

impl Entity for Client {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }
}

impl PartialEq for Client {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Client {}

fn validate_bounded(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdpError::required(field));
    }
    if trimmed.chars().count() > max {
        return Err(IdpError::out_of_range(
            field,
            format!("{} must be at most {} characters", field, max),
        ));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_secret(secret: &str) -> Result<String> {
    if secret.chars().count() < CLIENT_SECRET_MIN_LENGTH {
        return Err(IdpError::out_of_range(
            "clientSecret",
            format!(
                "clientSecret must be at least {} characters",
                CLIENT_SECRET_MIN_LENGTH
            ),
        ));
    }
    Ok(secret.to_string())
}

fn validate_redirect_uris(uris: Vec<String>) -> Result<Vec<String>> {
    if uris.is_empty() {
        return Err(IdpError::out_of_range(
            "redirectUris",
            "At least one redirect URI is required",
        ));
    }
    for uri in &uris {
        if url::Url::parse(uri).is_err() {
            return Err(IdpError::invalid_format(
                "redirectUris",
                format!("'{}' is not an absolute URI", uri),
            ));
        }
    }
    Ok(dedupe(uris))
}

fn validate_scopes(scopes: Vec<String>) -> Result<Vec<String>> {
    if scopes.is_empty() {
        return Err(IdpError::out_of_range(
            "allowedScopes",
            "At least one scope is required",
        ));
    }
    if scopes.iter().any(|s| s.trim().is_empty()) {
        return Err(IdpError::invalid_format(
            "allowedScopes",
            "Scopes must not be blank",
        ));
    }
    Ok(dedupe(scopes))
}

/// Drop repeated entries, keeping first-seen order.
fn dedupe(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Storage shape of a client. Includes the secret.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub client_type: ClientType,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub allowed_scopes: Vec<String>,
    #[serde(default)]
    pub metadata: ClientMetadata,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

fn redacted(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "[REDACTED]")
}

impl fmt::Debug for NewClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewClient")
            .field("name", &self.name)
            .field("client_type", &self.client_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("redirect_uris", &self.redirect_uris)
            .field("allowed_scopes", &self.allowed_scopes)
            .finish()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", self.id())
            .field("name", &self.name)
            .field("client_type", &self.client_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("redirect_uris", &self.redirect_uris)
            .field("allowed_scopes", &self.allowed_scopes)
            .field("active", &self.active)
            .finish()
    }
}

impl fmt::Debug for ClientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("client_type", &self.client_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("redirect_uris", &self.redirect_uris)
            .field("allowed_scopes", &self.allowed_scopes)
            .field("active", &self.active)
            .finish()
    }
}

/// Read model of a client. The secret is reduced to `has_secret`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub id: String,
    pub name: String,
    pub client_type: ClientType,
    pub client_id: String,
    pub has_secret: bool,
    pub redirect_uris: Vec<String>,
    pub allowed_scopes: Vec<String>,
    pub metadata: ClientMetadata,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Client> for ClientView {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id().to_string(),
            name: client.name.clone(),
            client_type: client.client_type,
            client_id: client.client_id.clone(),
            has_secret: client.has_secret(),
            redirect_uris: client.redirect_uris.clone(),
            allowed_scopes: client.allowed_scopes.clone(),
            metadata: client.metadata.clone(),
            active: client.active,
            created_at: client.created_at(),
            updated_at: client.updated_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::ValidationKind;
    use serde_json::json;

    fn new_client() -> NewClient {
        NewClient::new("Portal", ClientType::Oidc, "portal")
            .with_secret("s3cret-value")
            .with_redirect_uri("https://a/cb")
            .with_scopes(["openid", "profile", "openid"])
    }

    #[test]
    fn test_client_type_serde() {
        assert_eq!(serde_json::to_string(&ClientType::Oauth2).unwrap(), "\"oauth2\"");
        assert_eq!(
            serde_json::from_str::<ClientType>("\"saml\"").unwrap(),
            ClientType::Saml
        );
        assert_eq!(ClientType::parse("OIDC"), Some(ClientType::Oidc));
        assert_eq!(ClientType::parse("ldap"), None);
    }

    #[test]
    fn test_new_client_defaults() {
        let client = Client::new(new_client()).unwrap();
        assert!(client.is_active());
        assert!(client.has_secret());
        assert_eq!(client.client_type(), ClientType::Oidc);
        assert_eq!(client.allowed_scopes(), ["openid", "profile"]);
    }

    #[test]
    fn test_redirect_uri_exact_match() {
        let client = Client::new(new_client()).unwrap();
        assert!(client.is_redirect_uri_allowed("https://a/cb"));
        assert!(!client.is_redirect_uri_allowed("https://a/cb/"));
        assert!(!client.is_redirect_uri_allowed("HTTPS://A/cb"));
        assert!(!client.is_redirect_uri_allowed("https://a/cb?x=1"));
    }

    #[test]
    fn test_scope_exact_match() {
        let client = Client::new(new_client()).unwrap();
        assert!(client.is_scope_allowed("openid"));
        assert!(!client.is_scope_allowed("OpenID"));
        assert!(!client.is_scope_allowed("email"));
    }

    #[test]
    fn test_registration_invariants() {
        let err = Client::new(NewClient::new("", ClientType::Saml, "sp")
            .with_redirect_uri("https://sp/acs")
            .with_scopes(["openid"]))
        .unwrap_err();
        assert!(matches!(err, IdpError::Validation { ref field, .. } if field == "name"));

        let err = Client::new(NewClient::new("SP", ClientType::Saml, "sp").with_scopes(["openid"]))
            .unwrap_err();
        assert!(matches!(
            err,
            IdpError::Validation { kind: ValidationKind::OutOfRange, ref field, .. } if field == "redirectUris"
        ));

        let err = Client::new(NewClient::new("SP", ClientType::Saml, "sp")
            .with_redirect_uri("/relative/path")
            .with_scopes(["openid"]))
        .unwrap_err();
        assert!(matches!(
            err,
            IdpError::Validation { kind: ValidationKind::InvalidFormat, .. }
        ));

        let err = Client::new(NewClient::new("SP", ClientType::Saml, "sp")
            .with_redirect_uri("https://sp/acs"))
        .unwrap_err();
        assert!(matches!(err, IdpError::Validation { ref field, .. } if field == "allowedScopes"));

        let err = Client::new(new_client().with_secret("short")).unwrap_err();
        assert!(matches!(err, IdpError::Validation { ref field, .. } if field == "clientSecret"));
    }

    #[test]
    fn test_rotate_secret_overwrites() {
        let mut client = Client::new(new_client()).unwrap();
        let before = client.updated_at();
        std::thread::sleep(std::time::Duration::from_millis(2));
        client.rotate_secret("brand-new-secret");
        assert_eq!(client.client_secret(), Some("brand-new-secret"));
        assert!(client.updated_at() > before);
    }

    #[test]
    fn test_updates_replace_wholesale() {
        let mut client = Client::new(new_client()).unwrap();
        client
            .update_redirect_uris(vec!["https://b/cb".into(), "https://c/cb".into()])
            .unwrap();
        assert_eq!(client.redirect_uris(), ["https://b/cb", "https://c/cb"]);

        assert!(client.update_allowed_scopes(vec![]).is_err());
        assert_eq!(client.allowed_scopes(), ["openid", "profile"]);

        let mut metadata = ClientMetadata::new();
        metadata.insert("entityId".into(), json!("urn:sp"));
        client.update_metadata(metadata);
        assert_eq!(client.metadata().len(), 1);

        client.update_name("Renamed").unwrap();
        assert_eq!(client.name(), "Renamed");
    }

    #[test]
    fn test_view_hides_secret_and_record_roundtrips() {
        let client = Client::new(new_client().with_metadata("logoutUrl", json!("https://a/logout"))).unwrap();
        let view = client.to_view();
        assert!(view.has_secret);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("s3cret-value"));

        let restored = Client::restore(client.to_record());
        assert_eq!(restored, client);
        assert_eq!(restored.client_secret(), Some("s3cret-value"));
        assert_eq!(restored.metadata(), client.metadata());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let client = Client::new(new_client()).unwrap();
        for rendered in [
            format!("{:?}", new_client()),
            format!("{:?}", client),
            format!("{:?}", client.to_record()),
        ] {
            assert!(!rendered.contains("s3cret-value"), "{rendered}");
            assert!(rendered.contains("[REDACTED]"), "{rendered}");
            assert!(rendered.contains("portal"), "{rendered}");
        }
    }
}
