//! Sponsor assignment for new signups.
//!
//! Precedence, first match wins:
//! 1. `aff` URL parameter naming an existing account (always re-sets the
//!    tracking cookie),
//! 2. tracking cookie naming an existing account,
//! 3. random active account, or the configured fallback sponsor.
//!
//! A sponsor assigned by step 3 is written to the tracking cookie only when
//! the configuration asks for it. The resolver never touches the response;
//! the cookie to write is part of the returned [`SponsorResolution`].

use crate::config::AffiliateConfig;
use crate::db::UserRepository;
use crate::error::Result;
use crate::models::User;

#[derive(Debug, Clone, Default)]
pub struct SponsorRequest {
    pub affiliate_param: Option<String>,
    pub cookie_value: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SponsorResolution {
    pub sponsor: Option<User>,
    /// Username to store in the tracking cookie.
    pub set_cookie: Option<String>,
}

pub struct SponsorResolver<'a> {
    users: &'a dyn UserRepository,
    config: &'a AffiliateConfig,
}

impl<'a> SponsorResolver<'a> {
    pub fn new(users: &'a dyn UserRepository, config: &'a AffiliateConfig) -> Self {
        Self { users, config }
    }

    pub async fn resolve(&self, request: &SponsorRequest) -> Result<SponsorResolution> {
        if let Some(username) = non_blank(&request.affiliate_param) {
            if let Some(sponsor) = self.users.find_by_username(username).await? {
                tracing::debug!(sponsor = %sponsor.username, "sponsor taken from affiliate link");
                return Ok(SponsorResolution {
                    set_cookie: Some(sponsor.username.clone()),
                    sponsor: Some(sponsor),
                });
            }
            tracing::debug!(affiliate = username, "affiliate link names no active account");
        }

        if let Some(username) = non_blank(&request.cookie_value) {
            if let Some(sponsor) = self.users.find_by_username(username).await? {
                tracing::debug!(sponsor = %sponsor.username, "sponsor taken from tracking cookie");
                return Ok(SponsorResolution {
                    sponsor: Some(sponsor),
                    set_cookie: None,
                });
            }
        }

        let assigned = if self.config.randomize_on_signup_page {
            self.users.random_active_user().await?
        } else if self.config.fallback_on_signup_page {
            match self.config.fallback_sponsor() {
                Some(username) => self.users.find_by_username(username).await?,
                None => None,
            }
        } else {
            None
        };

        let set_cookie = match &assigned {
            Some(sponsor) if self.config.store_cookie_on_signup_page => {
                Some(sponsor.username.clone())
            }
            _ => None,
        };
        if let Some(sponsor) = &assigned {
            tracing::debug!(sponsor = %sponsor.username, "sponsor assigned on signup page");
        }

        Ok(SponsorResolution {
            sponsor: assigned,
            set_cookie,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
