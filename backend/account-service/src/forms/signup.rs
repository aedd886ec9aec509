use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{require, FormErrors};
use crate::db::UserRepository;
use crate::error::Result;
use crate::models::{User, UserStatus};
use crate::security::hash_password;
use crate::services::AccountMailer;

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct SignupForm {
    #[validate(length(min = 2, max = 255, message = "Username should contain 2 to 255 characters."))]
    pub username: String,
    #[validate(
        email(message = "Email is not a valid email address."),
        length(max = 255, message = "Email should contain at most 255 characters.")
    )]
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip)]
    pub(crate) errors: FormErrors,
}

impl SignupForm {
    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub async fn validate_with(
        &mut self,
        users: &dyn UserRepository,
        password_min_length: usize,
    ) -> Result<bool> {
        self.errors = FormErrors::new();
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();

        require(&mut self.errors, "username", &self.username);
        require(&mut self.errors, "email", &self.email);
        if require(&mut self.errors, "password", &self.password)
            && self.password.chars().count() < password_min_length
        {
            self.errors.add(
                "password",
                format!("Password should contain at least {} characters.", password_min_length),
            );
        }

        if let Err(violations) = self.validate() {
            self.errors.absorb(&violations);
        }

        if !self.errors.has("username") && users.username_taken(&self.username).await? {
            self.errors
                .add("username", "This username has already been taken.");
        }
        if !self.errors.has("email") && users.email_taken(&self.email).await? {
            self.errors
                .add("email", "This email address has already been taken.");
        }

        Ok(self.errors.is_empty())
    }

    /// Create the account, crediting `sponsor`.
    ///
    /// When `require_verification` is set the account starts inactive and a
    /// verification email is sent; the signup only counts as done if that
    /// email went out.
    pub async fn signup(
        &mut self,
        users: &dyn UserRepository,
        mailer: &AccountMailer,
        sponsor: Option<&User>,
        require_verification: bool,
        password_min_length: usize,
    ) -> Result<Option<User>> {
        if !self.validate_with(users, password_min_length).await? {
            return Ok(None);
        }

        let status = if require_verification {
            UserStatus::Inactive
        } else {
            UserStatus::Active
        };
        let mut user = User::new(
            &self.username,
            &self.email,
            hash_password(&self.password)?,
            status,
        );
        user.sponsor_id = sponsor.map(|s| s.id);
        if require_verification {
            user.generate_email_verification_token();
        }

        users.insert(&user).await?;
        tracing::info!(
            user_id = %user.id,
            sponsor_id = ?user.sponsor_id,
            "account created"
        );

        if require_verification && !mailer.send_verification(&user).await {
            return Ok(None);
        }
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::InMemoryUserRepository;
    use crate::services::{LogMailer, MailSettings};
    use std::sync::Arc;

    fn mailer() -> (AccountMailer, Arc<LogMailer>) {
        let log = Arc::new(LogMailer::new());
        let settings = MailSettings::from_config(&Config::default());
        (AccountMailer::new(log.clone(), settings), log)
    }

    fn form(username: &str, email: &str, password: &str) -> SignupForm {
        SignupForm {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            ..SignupForm::default()
        }
    }

    #[tokio::test]
    async fn creates_inactive_account_and_sends_verification() {
        let users = InMemoryUserRepository::new();
        let (mailer, log) = mailer();
        let mut form = form("carol", "carol@example.com", "secret123");

        let user = form
            .signup(&users, &mailer, None, true, 8)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user.status, UserStatus::Inactive);
        assert!(user.verification_token.is_some());
        assert_eq!(log.sent().await.len(), 1);
        assert!(users.username_taken("carol").await.unwrap());
    }

    #[tokio::test]
    async fn creates_active_account_without_verification() {
        let users = InMemoryUserRepository::new();
        let (mailer, log) = mailer();
        let sponsor = User::new("root", "root@example.com", "h".into(), UserStatus::Active);
        let mut form = form("carol", "carol@example.com", "secret123");

        let user = form
            .signup(&users, &mailer, Some(&sponsor), false, 8)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.sponsor_id, Some(sponsor.id));
        assert!(log.sent().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_username_and_email_are_rejected() {
        let existing = User::new("carol", "carol@example.com", "h".into(), UserStatus::Active);
        let users = InMemoryUserRepository::with_users(vec![existing]);
        let mut form = form("carol", "carol@example.com", "secret123");

        assert!(!form.validate_with(&users, 8).await.unwrap());
        assert_eq!(
            form.errors().first("username"),
            Some("This username has already been taken.")
        );
        assert_eq!(
            form.errors().first("email"),
            Some("This email address has already been taken.")
        );
    }

    #[tokio::test]
    async fn field_rules() {
        let users = InMemoryUserRepository::new();
        let mut form = form("c", "not-an-email", "short");

        assert!(!form.validate_with(&users, 8).await.unwrap());
        assert!(form.errors().has("username"));
        assert_eq!(
            form.errors().first("email"),
            Some("Email is not a valid email address.")
        );
        assert_eq!(
            form.errors().first("password"),
            Some("Password should contain at least 8 characters.")
        );
    }

    #[tokio::test]
    async fn blank_form_reports_required_fields() {
        let users = InMemoryUserRepository::new();
        let mut form = SignupForm::default();

        assert!(!form.validate_with(&users, 8).await.unwrap());
        assert_eq!(form.errors().first("username"), Some("Username cannot be blank."));
        assert_eq!(form.errors().first("email"), Some("Email cannot be blank."));
        assert_eq!(form.errors().first("password"), Some("Password cannot be blank."));
    }
}
