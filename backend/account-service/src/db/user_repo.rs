use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{User, UserStatus};

const USER_COLUMNS: &str = r#"
    id, username, email, auth_key, password_hash, password_reset_token,
    verification_token, status, sponsor_id, created_at, updated_at
"#;

/// Postgres-backed account store
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional(&self, filter: &str, arg: &str, status: UserStatus) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} = $1 AND status = $2",
            USER_COLUMNS, filter
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(arg)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_optional("username", username, UserStatus::Active)
            .await
    }

    async fn find_by_email(&self, email: &str, status: UserStatus) -> Result<Option<User>> {
        self.fetch_optional("email", email, status).await
    }

    async fn find_by_password_reset_token(&self, token: &str) -> Result<Option<User>> {
        self.fetch_optional("password_reset_token", token, UserStatus::Active)
            .await
    }

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>> {
        self.fetch_optional("verification_token", token, UserStatus::Inactive)
            .await
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(taken)
    }

    async fn email_taken(&self, email: &str) -> Result<bool> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(taken)
    }

    async fn random_active_user(&self) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE status = $1 ORDER BY random() LIMIT 1",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(UserStatus::Active)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, auth_key, password_hash, password_reset_token,
                               verification_token, status, sponsor_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.auth_key)
        .bind(&user.password_hash)
        .bind(&user.password_reset_token)
        .bind(&user.verification_token)
        .bind(user.status)
        .bind(user.sponsor_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("unique constraint") {
                AppError::Conflict("Username or email already registered".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, auth_key = $4, password_hash = $5,
                password_reset_token = $6, verification_token = $7, status = $8,
                sponsor_id = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.auth_key)
        .bind(&user.password_hash)
        .bind(&user.password_reset_token)
        .bind(&user.verification_token)
        .bind(user.status)
        .bind(user.sponsor_id)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
