use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use std::sync::Arc;

use super::{Outcome, RequestContext, View};
use crate::config::Config;
use crate::db::UserRepository;
use crate::error::Result;
use crate::forms::{
    ContactForm, LoginForm, PasswordResetRequestForm, ResendVerificationEmailForm,
    ResetPasswordForm, ResetPasswordInput, SignupForm, VerifyEmailForm,
};
use crate::metrics;
use crate::services::{AccountMailer, SponsorRequest, SponsorResolver};
use crate::session::FlashKind;

const NO_SIDEBAR: &str = "no-sidebar";

pub const LOGGED_OUT: &str = "You have been logged out!";
pub const CONTACT_SENT: &str =
    "Thank you for contacting us. We will respond to you as soon as possible.";
pub const CONTACT_FAILED: &str = "There was an error sending your message.";
pub const ACCOUNT_CREATED: &str = "Your account has been created!";
pub const VERIFY_BEFORE_LOGIN: &str =
    "Before you can login, you must click the verification link in your email.";
pub const CHECK_EMAIL: &str = "Check your email for further instructions.";
pub const RESET_REQUEST_FAILED: &str =
    "Sorry, we are unable to reset password for the provided email address.";
pub const PASSWORD_RESET: &str = "Your password has been reset!";
pub const EMAIL_CONFIRMED: &str = "Your email has been confirmed!";
pub const VERIFY_FAILED: &str = "Sorry, we are unable to verify your account with provided token.";
pub const RESEND_FAILED: &str =
    "Sorry, we are unable to resend a verification email for the provided email address.";

/// User-facing account actions.
///
/// Form arguments are `None` when the request carried no form body; such
/// requests render the empty form.
pub struct SiteController {
    users: Arc<dyn UserRepository>,
    mailer: AccountMailer,
    config: Arc<Config>,
}

impl SiteController {
    pub fn new(users: Arc<dyn UserRepository>, mailer: AccountMailer, config: Arc<Config>) -> Self {
        Self {
            users,
            mailer,
            config,
        }
    }

    /// Home page, showing the logged-in account.
    pub async fn index(&self, ctx: &mut RequestContext) -> Result<Outcome> {
        let user = match ctx.user_id() {
            Some(id) => self.users.find_by_id(id).await?,
            None => None,
        };
        let view = View::new("index").model(&serde_json::json!({ "user": user }))?;
        Ok(ctx.render(view))
    }

    pub async fn login(&self, ctx: &mut RequestContext, input: Option<LoginForm>) -> Result<Outcome> {
        if !ctx.is_guest() {
            return Ok(ctx.go_home());
        }

        let mut form = match input {
            Some(mut form) => {
                metrics::inc_login_requests();
                if let Some(user) = form.authenticate(self.users.as_ref()).await? {
                    ctx.login(&user, form.remember_me);
                    tracing::info!(user_id = %user.id, "user logged in");
                    return Ok(ctx.go_back());
                }
                metrics::inc_login_failures();
                tracing::debug!(username = %form.username, "login rejected");
                form
            }
            None => LoginForm::default(),
        };
        form.password.clear();

        let view = View::new("login")
            .layout(NO_SIDEBAR)
            .model(&form)?
            .errors(form.errors());
        Ok(ctx.render(view))
    }

    pub fn logout(&self, ctx: &mut RequestContext) -> Outcome {
        let user_id = ctx.user_id();
        if ctx.logout() {
            tracing::info!(user_id = ?user_id, "user logged out");
            ctx.flash(FlashKind::Success, LOGGED_OUT);
        }
        ctx.go_home()
    }

    pub async fn contact(&self, ctx: &mut RequestContext, input: Option<ContactForm>) -> Result<Outcome> {
        let form = match input {
            Some(mut form) => {
                if form.validate_input() {
                    if form
                        .send_email(&self.mailer, &self.config.site.contact_email)
                        .await
                    {
                        ctx.flash(FlashKind::Success, CONTACT_SENT);
                    } else {
                        ctx.flash(FlashKind::Error, CONTACT_FAILED);
                    }
                    return Ok(ctx.refresh());
                }
                form
            }
            None => ContactForm::default(),
        };

        let view = View::new("contact").model(&form)?.errors(form.errors());
        Ok(ctx.render(view))
    }

    pub async fn signup(
        &self,
        ctx: &mut RequestContext,
        affiliate_param: Option<String>,
        input: Option<SignupForm>,
    ) -> Result<Outcome> {
        let affiliate = &self.config.affiliate;
        let request = SponsorRequest {
            affiliate_param,
            cookie_value: ctx.cookie(&affiliate.cookie_name).map(str::to_string),
        };
        let resolution = SponsorResolver::new(self.users.as_ref(), affiliate)
            .resolve(&request)
            .await?;

        if let Some(username) = resolution.set_cookie {
            let cookie = Cookie::build(affiliate.cookie_name.clone(), username)
                .path("/")
                .http_only(true)
                .max_age(CookieDuration::days(affiliate.cookie_lifetime_days))
                .finish();
            ctx.set_cookie(cookie);
        }
        let sponsor = resolution.sponsor;

        let form = match input {
            Some(mut form) => {
                let site = &self.config.site;
                let created = form
                    .signup(
                        self.users.as_ref(),
                        &self.mailer,
                        sponsor.as_ref(),
                        site.signup_validation,
                        site.password_min_length,
                    )
                    .await?;
                if created.is_some() {
                    metrics::inc_signups();
                    let message = if site.signup_validation {
                        format!("{} {}", ACCOUNT_CREATED, VERIFY_BEFORE_LOGIN)
                    } else {
                        ACCOUNT_CREATED.to_string()
                    };
                    ctx.flash(FlashKind::Success, message);
                    return Ok(ctx.go_home());
                }
                form
            }
            None => SignupForm::default(),
        };

        let view = View::new("signup")
            .layout(NO_SIDEBAR)
            .model(&form)?
            .errors(form.errors())
            .sponsor(sponsor.as_ref());
        Ok(ctx.render(view))
    }

    pub async fn request_password_reset(
        &self,
        ctx: &mut RequestContext,
        input: Option<PasswordResetRequestForm>,
    ) -> Result<Outcome> {
        let form = match input {
            Some(mut form) => {
                if form.validate_with(self.users.as_ref()).await? {
                    let sent = form
                        .send_email(
                            self.users.as_ref(),
                            &self.mailer,
                            self.config.site.password_reset_token_expire,
                        )
                        .await?;
                    if sent {
                        ctx.flash(FlashKind::Success, CHECK_EMAIL);
                        return Ok(ctx.go_home());
                    }
                    ctx.flash(FlashKind::Error, RESET_REQUEST_FAILED);
                }
                form
            }
            None => PasswordResetRequestForm::default(),
        };

        let view = View::new("request_password_reset_token")
            .layout(NO_SIDEBAR)
            .model(&form)?
            .errors(form.errors());
        Ok(ctx.render(view))
    }

    /// Fails with a client error before any form is shown when the token is bad.
    pub async fn reset_password(
        &self,
        ctx: &mut RequestContext,
        token: Option<&str>,
        input: Option<ResetPasswordInput>,
    ) -> Result<Outcome> {
        let site = &self.config.site;
        let mut form = ResetPasswordForm::from_token(
            token,
            self.users.as_ref(),
            site.password_reset_token_expire,
        )
        .await?;

        if let Some(input) = input {
            form.load(input);
            if form.validate_input(site.password_min_length)
                && form.reset_password(self.users.as_ref()).await?
            {
                ctx.flash(FlashKind::Success, PASSWORD_RESET);
                return Ok(ctx.go_home());
            }
        }

        let view = View::new("reset_password")
            .layout(NO_SIDEBAR)
            .model(&serde_json::json!({ "password": "" }))?
            .errors(form.errors());
        Ok(ctx.render(view))
    }

    /// Activates the account and logs it in.
    pub async fn verify_email(&self, ctx: &mut RequestContext, token: Option<&str>) -> Result<Outcome> {
        let form = VerifyEmailForm::from_token(token, self.users.as_ref()).await?;

        if let Some(user) = form.verify_email(self.users.as_ref()).await? {
            if user.is_active() {
                ctx.login(&user, false);
                ctx.flash(FlashKind::Success, EMAIL_CONFIRMED);
                return Ok(ctx.go_home());
            }
        }

        ctx.flash(FlashKind::Error, VERIFY_FAILED);
        Ok(ctx.go_home())
    }

    pub async fn resend_verification_email(
        &self,
        ctx: &mut RequestContext,
        input: Option<ResendVerificationEmailForm>,
    ) -> Result<Outcome> {
        let form = match input {
            Some(mut form) => {
                if form.validate_with(self.users.as_ref()).await? {
                    if form.send_email(self.users.as_ref(), &self.mailer).await? {
                        ctx.flash(FlashKind::Success, CHECK_EMAIL);
                        return Ok(ctx.go_home());
                    }
                    ctx.flash(FlashKind::Error, RESEND_FAILED);
                }
                form
            }
            None => ResendVerificationEmailForm::default(),
        };

        let view = View::new("resend_verification_email")
            .layout(NO_SIDEBAR)
            .model(&form)?
            .errors(form.errors());
        Ok(ctx.render(view))
    }
}
