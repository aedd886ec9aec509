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
pub struct ResendVerificationEmailForm {
    #[validate(email(message = "Email is not a valid email address."))]
    pub email: String,
    #[serde(skip)]
    pub(crate) errors: FormErrors,
}

impl ResendVerificationEmailForm {
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
                .find_by_email(&self.email, UserStatus::Inactive)
                .await?
                .is_none()
        {
            self.errors.add("email", NO_SUCH_USER);
        }

        Ok(self.errors.is_empty())
    }

    pub async fn send_email(&self, users: &dyn UserRepository, mailer: &AccountMailer) -> Result<bool> {
        let Some(mut user) = users
            .find_by_email(&self.email, UserStatus::Inactive)
            .await?
        else {
            return Ok(false);
        };

        if user.verification_token.is_none() {
            user.generate_email_verification_token();
            user.touch();
            users.update(&user).await?;
        }

        Ok(mailer.send_verification(&user).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::InMemoryUserRepository;
    use crate::models::User;
    use crate::services::{LogMailer, MailSettings};
    use std::sync::Arc;

    fn form(email: &str) -> ResendVerificationEmailForm {
        ResendVerificationEmailForm {
            email: email.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn only_inactive_accounts_qualify() {
        let users = InMemoryUserRepository::with_users(vec![
            User::new("alice", "alice@example.com", "h".into(), UserStatus::Active),
            User::new("bob", "bob@example.com", "h".into(), UserStatus::Inactive),
        ]);

        assert!(form("bob@example.com").validate_with(&users).await.unwrap());

        let mut active = form("alice@example.com");
        assert!(!active.validate_with(&users).await.unwrap());
        assert_eq!(active.errors().first("email"), Some(NO_SUCH_USER));
    }

    #[tokio::test]
    async fn missing_token_is_generated_before_sending() {
        let users = InMemoryUserRepository::with_users(vec![User::new(
            "bob",
            "bob@example.com",
            "h".into(),
            UserStatus::Inactive,
        )]);
        let log = Arc::new(LogMailer::new());
        let mailer = AccountMailer::new(log.clone(), MailSettings::from_config(&Config::default()));

        assert!(form("bob@example.com")
            .send_email(&users, &mailer)
            .await
            .unwrap());

        let bob = users
            .find_by_email("bob@example.com", UserStatus::Inactive)
            .await
            .unwrap()
            .unwrap();
        let token = bob.verification_token.unwrap();
        assert!(log.sent().await[0].text_body.contains(&token));
    }
}
