/// Account emails: password reset links, verification links, contact messages
use std::sync::Arc;

use super::mailer::{Address, Email, Mailer};
use crate::config::Config;
use crate::metrics;
use crate::models::User;

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub app_name: String,
    /// Absolute site URL links are built from, without trailing slash.
    pub base_url: String,
    pub sender: Address,
}

impl MailSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            app_name: config.app.name.clone(),
            base_url: config.app.base_url.trim_end_matches('/').to_string(),
            sender: Address::new(
                config.site.sender_email.clone(),
                Some(config.site.sender_name(&config.app.name)),
            ),
        }
    }
}

/// Composes account emails and hands them to the configured transport.
///
/// Every `send_*` method reports delivery as a plain bool: a failed send is an
/// expected outcome the caller turns into a flash message.
#[derive(Clone)]
pub struct AccountMailer {
    mailer: Arc<dyn Mailer>,
    settings: MailSettings,
}

impl AccountMailer {
    pub fn new(mailer: Arc<dyn Mailer>, settings: MailSettings) -> Self {
        Self { mailer, settings }
    }

    pub fn settings(&self) -> &MailSettings {
        &self.settings
    }

    pub fn password_reset_link(&self, token: &str) -> String {
        format!(
            "{}/site/reset-password?token={}",
            self.settings.base_url,
            urlencoding::encode(token)
        )
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!(
            "{}/site/verify-email?token={}",
            self.settings.base_url,
            urlencoding::encode(token)
        )
    }

    pub async fn send_password_reset(&self, user: &User) -> bool {
        let Some(token) = user.password_reset_token.as_deref() else {
            tracing::warn!(user_id = %user.id, "password reset requested without a token");
            return false;
        };
        let link = self.password_reset_link(token);

        let email = Email {
            from: self.settings.sender.clone(),
            to: Address::new(user.email.clone(), Some(user.username.clone())),
            reply_to: None,
            subject: format!("Password reset for {}", self.settings.app_name),
            text_body: format!(
                "Hello {},\n\nFollow the link below to reset your password:\n\n{}\n",
                user.username, link
            ),
            html_body: Some(format!(
                "<div class=\"password-reset\">\
                 <p>Hello {},</p>\
                 <p>Follow the link below to reset your password:</p>\
                 <p><a href=\"{link}\">{link}</a></p>\
                 </div>",
                escape_html(&user.username),
                link = escape_html(&link)
            )),
        };
        self.deliver(&email, "password_reset").await
    }

    pub async fn send_verification(&self, user: &User) -> bool {
        let Some(token) = user.verification_token.as_deref() else {
            tracing::warn!(user_id = %user.id, "verification email requested without a token");
            return false;
        };
        let link = self.verification_link(token);

        let email = Email {
            from: self.settings.sender.clone(),
            to: Address::new(user.email.clone(), Some(user.username.clone())),
            reply_to: None,
            subject: format!("Account registration at {}", self.settings.app_name),
            text_body: format!(
                "Hello {},\n\nFollow the link below to verify your email:\n\n{}\n",
                user.username, link
            ),
            html_body: Some(format!(
                "<div class=\"verify-email\">\
                 <p>Hello {},</p>\
                 <p>Follow the link below to verify your email:</p>\
                 <p><a href=\"{link}\">{link}</a></p>\
                 </div>",
                escape_html(&user.username),
                link = escape_html(&link)
            )),
        };
        self.deliver(&email, "verification").await
    }

    /// Forward a contact form submission; replies go to the submitter.
    pub async fn send_contact(
        &self,
        to: &str,
        name: &str,
        reply_email: &str,
        subject: &str,
        body: &str,
    ) -> bool {
        let email = Email {
            from: self.settings.sender.clone(),
            to: Address::new(to, None),
            reply_to: Some(Address::new(reply_email, Some(name.to_string()))),
            subject: subject.to_string(),
            text_body: body.to_string(),
            html_body: None,
        };
        self.deliver(&email, "contact").await
    }

    async fn deliver(&self, email: &Email, kind: &'static str) -> bool {
        match self.mailer.send(email).await {
            Ok(()) => {
                metrics::inc_emails_sent(kind);
                tracing::debug!(kind, to = %email.to.email, "email sent");
                true
            }
            Err(e) => {
                metrics::inc_email_failures(kind);
                tracing::error!(kind, to = %email.to.email, error = %e, "failed to send email");
                false
            }
        }
    }
}

/// Escape HTML special characters for safe inclusion in mail bodies
fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
