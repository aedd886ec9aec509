use serde::{Deserialize, Serialize};

use super::{require, FormErrors};
use crate::db::UserRepository;
use crate::error::Result;
use crate::models::User;
use crate::security::verify_password;

pub const INCORRECT_CREDENTIALS: &str = "Incorrect username or password.";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(deserialize_with = "deserialize_checkbox")]
    pub remember_me: bool,
    #[serde(skip)]
    pub(crate) errors: FormErrors,
}

impl LoginForm {
    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    /// Check the credentials and return the matching active account.
    pub async fn authenticate(&mut self, users: &dyn UserRepository) -> Result<Option<User>> {
        self.errors = FormErrors::new();
        self.username = self.username.trim().to_string();

        let has_username = require(&mut self.errors, "username", &self.username);
        let has_password = require(&mut self.errors, "password", &self.password);
        if !(has_username && has_password) {
            return Ok(None);
        }

        let user = users.find_by_username(&self.username).await?;
        match user {
            Some(user) if verify_password(&self.password, &user.password_hash) => Ok(Some(user)),
            _ => {
                self.errors.add("password", INCORRECT_CREDENTIALS);
                Ok(None)
            }
        }
    }
}

/// HTML checkboxes post "1"/"on"; hidden fallbacks post "0".
fn deserialize_checkbox<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "on" | "true" | "yes"
    ))
}
