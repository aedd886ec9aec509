use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{require, FormErrors};
use crate::services::AccountMailer;

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    #[validate(email(message = "Email is not a valid email address."))]
    pub email: String,
    pub subject: String,
    pub body: String,
    #[serde(skip)]
    pub(crate) errors: FormErrors,
}

impl ContactForm {
    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn validate_input(&mut self) -> bool {
        self.errors = FormErrors::new();
        self.email = self.email.trim().to_string();

        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("body", &self.body),
        ] {
            require(&mut self.errors, field, value);
        }
        if let Err(violations) = self.validate() {
            self.errors.absorb(&violations);
        }

        self.errors.is_empty()
    }

    /// Forward the message to the site's contact address.
    pub async fn send_email(&self, mailer: &AccountMailer, to: &str) -> bool {
        mailer
            .send_contact(to, &self.name, &self.email, &self.subject, &self.body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            subject: "Question".into(),
            body: "How do I reset my password?".into(),
            ..ContactForm::default()
        }
    }

    #[test]
    fn complete_form_is_valid() {
        let mut form = form();
        assert!(form.validate_input());
    }

    #[test]
    fn every_field_is_required() {
        let mut form = ContactForm::default();
        assert!(!form.validate_input());
        for field in ["name", "email", "subject", "body"] {
            assert!(form.errors().has(field), "{} should be required", field);
        }
    }

    #[test]
    fn email_must_be_valid() {
        let mut form = ContactForm {
            email: "jane-at-example".into(),
            ..form()
        };
        assert!(!form.validate_input());
        assert_eq!(
            form.errors().first("email"),
            Some("Email is not a valid email address.")
        );
    }
}
