//! Form models behind the site actions.
//!
//! A form is loaded from the request body, validated against its rules and
//! the account store, and then performs one domain operation. Validation
//! failures are collected per field in [`FormErrors`] and rendered back to the
//! user; they are never raised as errors.

use serde::Serialize;
use std::collections::BTreeMap;
use validator::ValidationErrors;

pub mod contact;
pub mod login;
pub mod password_reset_request;
pub mod resend_verification_email;
pub mod reset_password;
pub mod signup;
pub mod verify_email;

pub use contact::ContactForm;
pub use login::LoginForm;
pub use password_reset_request::PasswordResetRequestForm;
pub use resend_verification_email::ResendVerificationEmailForm;
pub use reset_password::{ResetPasswordForm, ResetPasswordInput};
pub use signup::SignupForm;
pub use verify_email::VerifyEmailForm;

/// Field name → messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|m| m.first()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Merge rule violations, keeping only the first one for fields that have
    /// no error yet.
    pub fn absorb(&mut self, errors: &ValidationErrors) {
        for (field, violations) in errors.field_errors() {
            let field = field.to_string();
            if self.has(&field) {
                continue;
            }
            if let Some(violation) = violations.first() {
                let message = violation
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid.", label(&field)));
                self.add(&field, message);
            }
        }
    }
}

/// Record a "cannot be blank" error for an empty value.
pub(crate) fn require(errors: &mut FormErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, format!("{} cannot be blank.", label(field)));
        false
    } else {
        true
    }
}

/// Human label for a field name: `new_password` → `New Password`.
pub(crate) fn label(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(email(message = "Email is not a valid email address."))]
        email: String,
    }

    #[test]
    fn labels() {
        assert_eq!(label("username"), "Username");
        assert_eq!(label("remember_me"), "Remember Me");
    }

    #[test]
    fn require_flags_blank_values() {
        let mut errors = FormErrors::new();
        assert!(!require(&mut errors, "username", "   "));
        assert!(require(&mut errors, "email", "a@b.co"));
        assert_eq!(errors.first("username"), Some("Username cannot be blank."));
        assert!(!errors.has("email"));
    }

    #[test]
    fn absorb_keeps_existing_errors_first() {
        let sample = Sample {
            email: "not-an-email".into(),
        };
        let violations = sample.validate().unwrap_err();

        let mut errors = FormErrors::new();
        errors.absorb(&violations);
        assert_eq!(errors.first("email"), Some("Email is not a valid email address."));

        let mut errors = FormErrors::new();
        errors.add("email", "Email cannot be blank.");
        errors.absorb(&violations);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first("email"), Some("Email cannot be blank."));
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut errors = FormErrors::new();
        errors.add("password", "Incorrect username or password.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["password"][0], "Incorrect username or password.");
    }
}
