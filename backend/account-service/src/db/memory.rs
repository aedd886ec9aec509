use async_trait::async_trait;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{User, UserStatus};

/// Process-local account store for development and tests.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    async fn find<F>(&self, pred: F) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        self.users.read().await.iter().find(|u| pred(u)).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.find(|u| u.id == id).await)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .find(|u| u.username == username && u.status == UserStatus::Active)
            .await)
    }

    async fn find_by_email(&self, email: &str, status: UserStatus) -> Result<Option<User>> {
        Ok(self
            .find(|u| u.email == email && u.status == status)
            .await)
    }

    async fn find_by_password_reset_token(&self, token: &str) -> Result<Option<User>> {
        Ok(self
            .find(|u| {
                u.password_reset_token.as_deref() == Some(token) && u.status == UserStatus::Active
            })
            .await)
    }

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>> {
        Ok(self
            .find(|u| {
                u.verification_token.as_deref() == Some(token) && u.status == UserStatus::Inactive
            })
            .await)
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        Ok(self.find(|u| u.username == username).await.is_some())
    }

    async fn email_taken(&self, email: &str) -> Result<bool> {
        Ok(self.find(|u| u.email == email).await.is_some())
    }

    async fn random_active_user(&self) -> Result<Option<User>> {
        let users = self.users.read().await;
        let active: Vec<&User> = users.iter().filter(|u| u.is_active()).collect();
        Ok(active.choose(&mut rand::thread_rng()).map(|u| (*u).clone()))
    }

    async fn insert(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict(
                "Username or email already registered".to_string(),
            ));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::Database(format!("user {} not found", user.id))),
        }
    }
}
