/// Account storage
///
/// The site never owns user persistence; actions talk to it through
/// [`UserRepository`]. Postgres backs production, the in-memory store backs
/// development and tests.
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{User, UserStatus};

pub mod memory;
pub mod user_repo;

pub use memory::InMemoryUserRepository;
pub use user_repo::PgUserRepository;

pub async fn create_pool(database_url: &str, max_connections: u32) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Active account with the given username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str, status: UserStatus) -> Result<Option<User>>;

    /// Active account holding this reset token. Expiry is checked by the caller.
    async fn find_by_password_reset_token(&self, token: &str) -> Result<Option<User>>;

    /// Inactive account holding this verification token.
    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>>;

    /// Uniqueness checks span every status.
    async fn username_taken(&self, username: &str) -> Result<bool>;

    async fn email_taken(&self, email: &str) -> Result<bool>;

    /// One active account picked uniformly at random.
    async fn random_active_user(&self) -> Result<Option<User>>;

    async fn insert(&self, user: &User) -> Result<()>;

    async fn update(&self, user: &User) -> Result<()>;
}
