/// Configuration management
///
/// Every section is read from its own environment prefix (`APP_`, `SITE_`,
/// `AFFILIATE_`, `SESSION_`, `SMTP_`). Missing values fall back to defaults so
/// the service boots with in-memory collaborators on a bare environment.
use serde::Deserialize;
use std::env;

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub site: SiteConfig,
    pub affiliate: AffiliateConfig,
    pub session: SessionConfig,
    pub smtp: Option<SmtpConfig>,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_env")]
    pub env: String,

    #[serde(default = "default_app_host")]
    pub host: String,

    #[serde(default = "default_app_port")]
    pub port: u16,

    /// Absolute URL used to build links in outgoing email.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Site-wide parameters consumed by the account actions.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Recipient of contact form submissions.
    #[serde(default = "default_contact_email")]
    pub contact_email: String,

    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    #[serde(default)]
    pub sender_name: Option<String>,

    /// New accounts must confirm their email before they can log in.
    #[serde(default = "default_true")]
    pub signup_validation: bool,

    #[serde(default = "default_password_reset_token_expire")]
    pub password_reset_token_expire: i64,

    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,

    /// Session lifetime in seconds when "remember me" is ticked.
    #[serde(default = "default_remember_me_duration")]
    pub remember_me_duration: u64,
}

/// Sponsor assignment rules applied on the signup page.
#[derive(Debug, Clone, Deserialize)]
pub struct AffiliateConfig {
    #[serde(default)]
    pub randomize_on_signup_page: bool,

    #[serde(default)]
    pub fallback_on_signup_page: bool,

    #[serde(default)]
    pub fallback_sponsor: Option<String>,

    #[serde(default = "default_true")]
    pub store_cookie_on_signup_page: bool,

    #[serde(default = "default_affiliate_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_affiliate_cookie_lifetime_days")]
    pub cookie_lifetime_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default)]
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

// Default value functions
fn default_app_name() -> String {
    "My Application".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_contact_email() -> String {
    "admin@example.com".to_string()
}

fn default_sender_email() -> String {
    "noreply@example.com".to_string()
}

fn default_true() -> bool {
    true
}

fn default_password_reset_token_expire() -> i64 {
    3600 // 1 hour
}

fn default_password_min_length() -> usize {
    8
}

fn default_remember_me_duration() -> u64 {
    3600 * 24 * 30
}

fn default_affiliate_cookie_name() -> String {
    "aff".to_string()
}

fn default_affiliate_cookie_lifetime_days() -> i64 {
    30
}

fn default_session_cookie_name() -> String {
    "_session".to_string()
}

fn default_session_ttl_secs() -> u64 {
    1440
}

fn default_smtp_port() -> u16 {
    587
}

impl SiteConfig {
    /// Display name used in the From header of outgoing mail.
    pub fn sender_name(&self, app_name: &str) -> String {
        self.sender_name
            .clone()
            .unwrap_or_else(|| format!("{} robot", app_name))
    }
}

impl AffiliateConfig {
    /// Configured fallback sponsor, ignoring blank values.
    pub fn fallback_sponsor(&self) -> Option<&str> {
        self.fallback_sponsor
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let smtp = match env::var("SMTP_HOST") {
            Ok(_) => Some(envy::prefixed("SMTP_").from_env::<SmtpConfig>()?),
            Err(_) => None,
        };

        Ok(Config {
            app: envy::prefixed("APP_").from_env()?,
            site: envy::prefixed("SITE_").from_env()?,
            affiliate: envy::prefixed("AFFILIATE_").from_env()?,
            session: envy::prefixed("SESSION_").from_env()?,
            smtp,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig::default(),
            site: SiteConfig::default(),
            affiliate: AffiliateConfig::default(),
            session: SessionConfig::default(),
            smtp: None,
            database_url: None,
            redis_url: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            name: default_app_name(),
            env: default_app_env(),
            host: default_app_host(),
            port: default_app_port(),
            base_url: default_base_url(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            contact_email: default_contact_email(),
            sender_email: default_sender_email(),
            sender_name: None,
            signup_validation: true,
            password_reset_token_expire: default_password_reset_token_expire(),
            password_min_length: default_password_min_length(),
            remember_me_duration: default_remember_me_duration(),
        }
    }
}

impl Default for AffiliateConfig {
    fn default() -> Self {
        AffiliateConfig {
            randomize_on_signup_page: false,
            fallback_on_signup_page: false,
            fallback_sponsor: None,
            store_cookie_on_signup_page: true,
            cookie_name: default_affiliate_cookie_name(),
            cookie_lifetime_days: default_affiliate_cookie_lifetime_days(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            cookie_name: default_session_cookie_name(),
            ttl_secs: default_session_ttl_secs(),
            secure_cookie: false,
        }
    }
}
