use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{require, FormErrors};
use crate::db::UserRepository;
use crate::error::Result;
use crate::models::UserStatus;
use crate::services::AccountMailer;

pub const NO_SUCH_USER: &str = "There is no user with this email address.";

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct PasswordResetRequestForm {
    #[validate(email(message = "Email is not a valid email address."))]
    pub email: String,
    #[serde(skip)]
    pub(crate) errors: FormErrors,
}

impl PasswordResetRequestForm {
    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub async fn validate_with(&mut self, users: &dyn UserRepository) -> Result<bool> {
        self.errors = FormErrors::new();
        self.email = self.email.trim().to_string();

        if require(&mut self.errors, "email", &self.email) {
            if let Err(violations) = self.validate() {
                self.errors.absorb(&violations);
            }
        }
        if !self.errors.has("email")
            && users
                .find_by_email(&self.email, UserStatus::Active)
                .await?
                .is_none()
        {
            self.errors.add("email", NO_SUCH_USER);
        }

        Ok(self.errors.is_empty())
    }

    /// Mail a reset link, reusing a still valid token.
    pub async fn send_email(
        &self,
        users: &dyn UserRepository,
        mailer: &AccountMailer,
        token_expire_secs: i64,
    ) -> Result<bool> {
        let Some(mut user) = users.find_by_email(&self.email, UserStatus::Active).await? else {
            return Ok(false);
        };

        if !user.has_valid_password_reset_token(token_expire_secs) {
            user.generate_password_reset_token();
            user.touch();
            users.update(&user).await?;
        }

        Ok(mailer.send_password_reset(&user).await)
    }
}
