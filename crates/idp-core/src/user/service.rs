//! User administration.

use std::sync::Arc;

use tracing::info;

use super::entity::User;
use super::repository::UserRepository;
use crate::shared::error::{IdpError, Result};
use crate::shared::pagination::{Page, PageRequest};

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| IdpError::not_found("User", id))
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<User>> {
        self.users.find_all(page).await
    }

    pub async fn update_profile(&self, id: &str, first_name: &str, last_name: &str) -> Result<User> {
        let mut user = self.get(id).await?;
        user.update_profile(first_name, last_name)?;
        self.users.save(&user).await?;
        Ok(user)
    }

    pub async fn set_active(&self, id: &str, active: bool) -> Result<User> {
        let mut user = self.get(id).await?;
        if active {
            user.activate();
        } else {
            user.deactivate();
        }
        self.users.save(&user).await?;

        info!(user_id = %user.id(), active, "User activation changed");
        Ok(user)
    }

    pub async fn verify_email(&self, id: &str) -> Result<User> {
        let mut user = self.get(id).await?;
        if !user.is_email_verified() {
            user.verify_email();
            self.users.save(&user).await?;
        }
        Ok(user)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.users.delete(id).await? {
            return Err(IdpError::not_found("User", id));
        }
        info!(user_id = id, "User deleted");
        Ok(())
    }
}
