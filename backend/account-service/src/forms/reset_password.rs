use serde::Deserialize;

use super::{require, FormErrors};
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::{hash_password, token};

pub const BLANK_TOKEN: &str = "Password reset token cannot be blank.";
pub const WRONG_TOKEN: &str = "Wrong password reset token.";

/// Body posted to the reset page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordInput {
    pub password: String,
}

/// New-password form bound to the account owning a reset token.
#[derive(Debug, Clone)]
pub struct ResetPasswordForm {
    password: String,
    user: User,
    errors: FormErrors,
}

impl ResetPasswordForm {
    /// Bind the form to the token's account.
    ///
    /// Fails with [`AppError::InvalidToken`] when the token is blank,
    /// malformed, unknown or expired.
    pub async fn from_token(
        reset_token: Option<&str>,
        users: &dyn UserRepository,
        token_expire_secs: i64,
    ) -> Result<Self> {
        let reset_token = reset_token.map(str::trim).unwrap_or_default();
        if reset_token.is_empty() {
            return Err(AppError::InvalidToken(BLANK_TOKEN.to_string()));
        }
        if !token::is_well_formed(reset_token) {
            return Err(AppError::InvalidToken(WRONG_TOKEN.to_string()));
        }

        let user = users
            .find_by_password_reset_token(reset_token)
            .await?
            .filter(|u| u.has_valid_password_reset_token(token_expire_secs))
            .ok_or_else(|| AppError::InvalidToken(WRONG_TOKEN.to_string()))?;

        Ok(Self {
            password: String::new(),
            user,
            errors: FormErrors::new(),
        })
    }

    pub fn load(&mut self, input: ResetPasswordInput) {
        self.password = input.password;
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn validate_input(&mut self, password_min_length: usize) -> bool {
        self.errors = FormErrors::new();
        if require(&mut self.errors, "password", &self.password)
            && self.password.chars().count() < password_min_length
        {
            self.errors.add(
                "password",
                format!("Password should contain at least {} characters.", password_min_length),
            );
        }
        self.errors.is_empty()
    }

    /// Store the new password and burn the token.
    pub async fn reset_password(&mut self, users: &dyn UserRepository) -> Result<bool> {
        self.user.password_hash = hash_password(&self.password)?;
        self.user.remove_password_reset_token();
        self.user.regenerate_auth_key();
        self.user.touch();
        users.update(&self.user).await?;

        tracing::info!(user_id = %self.user.id, "password reset");
        Ok(true)
    }
}
