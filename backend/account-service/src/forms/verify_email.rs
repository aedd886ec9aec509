use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{User, UserStatus};
use crate::security::token;

pub const BLANK_TOKEN: &str = "Verify email token cannot be blank.";
pub const WRONG_TOKEN: &str = "Wrong verify email token.";

/// Email confirmation bound to the inactive account owning a token.
#[derive(Debug, Clone)]
pub struct VerifyEmailForm {
    user: User,
}

impl VerifyEmailForm {
    /// Fails with [`AppError::InvalidToken`] when the token is blank,
    /// malformed or matches no inactive account.
    pub async fn from_token(verify_token: Option<&str>, users: &dyn UserRepository) -> Result<Self> {
        let verify_token = verify_token.map(str::trim).unwrap_or_default();
        if verify_token.is_empty() {
            return Err(AppError::InvalidToken(BLANK_TOKEN.to_string()));
        }
        if !token::is_well_formed(verify_token) {
            return Err(AppError::InvalidToken(WRONG_TOKEN.to_string()));
        }

        let user = users
            .find_by_verification_token(verify_token)
            .await?
            .ok_or_else(|| AppError::InvalidToken(WRONG_TOKEN.to_string()))?;

        Ok(Self { user })
    }

    /// Activate the account. Returns the activated account.
    pub async fn verify_email(mut self, users: &dyn UserRepository) -> Result<Option<User>> {
        self.user.status = UserStatus::Active;
        self.user.verification_token = None;
        self.user.touch();

        match users.update(&self.user).await {
            Ok(()) => {
                tracing::info!(user_id = %self.user.id, "email verified");
                Ok(Some(self.user))
            }
            Err(e) => {
                tracing::error!(user_id = %self.user.id, error = %e, "failed to activate account");
                Ok(None)
            }
        }
    }
}
