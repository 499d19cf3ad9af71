//! In-memory repositories for tests and local development.
//!
//! Natural-key uniqueness is checked and the write applied under the same
//! write lock, so concurrent saves of the same email / client id yield
//! exactly one winner.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::auth::authorization_code::AuthorizationCode;
use crate::auth::authorization_code_repository::AuthorizationCodeRepository;
use crate::client::entity::{Client, ClientType};
use crate::client::repository::ClientRepository;
use crate::shared::email::Email;
use crate::shared::error::{IdpError, Result};
use crate::shared::pagination::{Page, PageRequest};
use crate::user::entity::User;
use crate::user::repository::UserRepository;

/// Newest first; ties broken by identifier so ordering is stable.
fn paginate<T: Clone>(
    mut items: Vec<T>,
    page: PageRequest,
    key: impl Fn(&T) -> (DateTime<Utc>, String),
) -> Page<T> {
    let total = items.len() as u64;
    if page.is_empty() {
        return Page::new(Vec::new(), page, total);
    }
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    let selected = items
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect();
    Page::new(selected, page, total)
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email() == email).cloned())
    }

    async fn save(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        let taken = users
            .values()
            .any(|existing| existing.email() == user.email() && existing.id() != user.id());
        if taken {
            return Err(IdpError::conflict("User", "email", user.email().as_str()));
        }
        users.insert(user.id().to_string(), user.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.users.write().await.remove(id).is_some())
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<User>> {
        let users: Vec<User> = self.users.read().await.values().cloned().collect();
        Ok(paginate(users, page, |u| (u.created_at(), u.id().to_string())))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: Arc<RwLock<HashMap<String, Client>>>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Client>> {
        Ok(self.clients.read().await.get(id).cloned())
    }

    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Client>> {
        let clients = self.clients.read().await;
        Ok(clients.values().find(|c| c.client_id() == client_id).cloned())
    }

    async fn find_by_type(&self, client_type: ClientType) -> Result<Vec<Client>> {
        let clients: Vec<Client> = self
            .clients
            .read()
            .await
            .values()
            .filter(|c| c.client_type() == client_type)
            .cloned()
            .collect();
        let all = PageRequest::new(0, clients.len() as u64);
        Ok(paginate(clients, all, |c| (c.created_at(), c.id().to_string())).items)
    }

    async fn save(&self, client: &Client) -> Result<()> {
        let mut clients = self.clients.write().await;
        let taken = clients.values().any(|existing| {
            existing.client_id() == client.client_id() && existing.id() != client.id()
        });
        if taken {
            return Err(IdpError::conflict("Client", "clientId", client.client_id()));
        }
        clients.insert(client.id().to_string(), client.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.clients.write().await.remove(id).is_some())
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Client>> {
        let clients: Vec<Client> = self.clients.read().await.values().cloned().collect();
        Ok(paginate(clients, page, |c| (c.created_at(), c.id().to_string())))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.clients.read().await.len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryAuthorizationCodeRepository {
    codes: Arc<RwLock<HashMap<String, AuthorizationCode>>>,
}

impl InMemoryAuthorizationCodeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorizationCodeRepository for InMemoryAuthorizationCodeRepository {
    async fn insert(&self, code: &AuthorizationCode) -> Result<()> {
        let mut codes = self.codes.write().await;
        if codes.contains_key(&code.code) {
            return Err(IdpError::conflict("AuthorizationCode", "code", "<redacted>"));
        }
        codes.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn consume(&self, code: &str) -> Result<Option<AuthorizationCode>> {
        let mut codes = self.codes.write().await;
        match codes.get_mut(code) {
            Some(stored) if !stored.used => {
                let before = stored.clone();
                stored.mark_used();
                Ok(Some(before))
            }
            _ => Ok(None),
        }
    }

    async fn find(&self, code: &str) -> Result<Option<AuthorizationCode>> {
        Ok(self.codes.read().await.get(code).cloned())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|_, code| !code.is_expired_at(now));
        Ok((before - codes.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::entity::NewClient;
    use chrono::Duration;

    fn user(email: &str) -> User {
        User::new(Email::parse(email).unwrap(), "Test", "User").unwrap()
    }

    fn client(client_id: &str, client_type: ClientType) -> Client {
        Client::new(
            NewClient::new("App", client_type, client_id)
                .with_redirect_uri("https://app/cb")
                .with_scopes(["openid"]),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_user_save_is_upsert() {
        let repo = InMemoryUserRepository::new();
        let mut u = user("a@example.com");
        repo.save(&u).await.unwrap();
        u.verify_email();
        repo.save(&u).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let found = repo.find_by_id(u.id().as_str()).await.unwrap().unwrap();
        assert!(found.is_email_verified());
    }

    #[tokio::test]
    async fn test_user_email_uniqueness() {
        let repo = InMemoryUserRepository::new();
        repo.save(&user("dup@example.com")).await.unwrap();
        let err = repo.save(&user("DUP@example.com")).await.unwrap_err();
        assert!(matches!(err, IdpError::Conflict { .. }));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_saves_single_winner() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.save(&user("race@example.com")).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_all_newest_first() {
        let repo = InMemoryUserRepository::new();
        for i in 0..3 {
            repo.save(&user(&format!("u{i}@example.com"))).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let page = repo.find_all(PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].email().as_str(), "u2@example.com");

        let rest = repo.find_all(PageRequest::new(2, 2)).await.unwrap();
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.items[0].email().as_str(), "u0@example.com");
    }

    #[tokio::test]
    async fn test_find_all_zero_limit_returns_total_only() {
        let repo = InMemoryClientRepository::new();
        repo.save(&client("sp", ClientType::Saml)).await.unwrap();
        repo.save(&client("rp", ClientType::Oidc)).await.unwrap();

        let page = repo.find_all(PageRequest::new(0, 0)).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_client_lookup_and_type_filter() {
        let repo = InMemoryClientRepository::new();
        repo.save(&client("sp", ClientType::Saml)).await.unwrap();
        repo.save(&client("rp", ClientType::Oidc)).await.unwrap();

        assert!(repo.find_by_client_id("sp").await.unwrap().is_some());
        assert!(repo.find_by_client_id("SP").await.unwrap().is_none());
        assert_eq!(repo.find_by_type(ClientType::Oidc).await.unwrap().len(), 1);
        assert!(repo.find_by_type(ClientType::Oauth2).await.unwrap().is_empty());

        let err = repo.save(&client("sp", ClientType::Oauth2)).await.unwrap_err();
        assert!(matches!(err, IdpError::Conflict { .. }));

        let id = repo.find_by_client_id("rp").await.unwrap().unwrap().id().to_string();
        assert!(repo.delete(&id).await.unwrap());
        assert!(!repo.delete(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_code_consume_once() {
        let repo = InMemoryAuthorizationCodeRepository::new();
        let code = AuthorizationCode::new("c1", "rp", "u1", "https://app/cb");
        repo.insert(&code).await.unwrap();
        assert!(repo.insert(&code).await.is_err());

        let first = repo.consume("c1").await.unwrap().unwrap();
        assert!(!first.used);
        assert!(repo.consume("c1").await.unwrap().is_none());
        assert!(repo.find("c1").await.unwrap().unwrap().used);
        assert!(repo.consume("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let repo = InMemoryAuthorizationCodeRepository::new();
        repo.insert(&AuthorizationCode::new("live", "rp", "u1", "https://app/cb"))
            .await
            .unwrap();
        repo.insert(
            &AuthorizationCode::new("stale", "rp", "u1", "https://app/cb")
                .with_ttl(Duration::seconds(-5)),
        )
        .await
        .unwrap();

        assert_eq!(repo.delete_expired(Utc::now()).await.unwrap(), 1);
        assert!(repo.find("live").await.unwrap().is_some());
        assert!(repo.find("stale").await.unwrap().is_none());
    }
}
