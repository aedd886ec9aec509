//! Site controller plumbing
//!
//! Every action gets a [`RequestContext`] holding the session and cookies of
//! the current request, runs one domain operation and returns an [`Outcome`]:
//! a view to render or a URL to redirect to. The handler layer turns the
//! outcome into an HTTP response after committing the session.

use actix_web::{
    cookie::Cookie,
    dev::Payload,
    http::{header, Method},
    web, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::forms::FormErrors;
use crate::models::User;
use crate::session::{Flash, FlashKind, SessionHandle, SessionManager};
use crate::AppState;

pub mod site;

pub use site::SiteController;

pub const HOME_URL: &str = "/";
pub const LOGIN_URL: &str = "/site/login";

/// Routable site actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Index,
    Login,
    Logout,
    Contact,
    Signup,
    RequestPasswordReset,
    ResetPassword,
    VerifyEmail,
    ResendVerificationEmail,
    Error,
}

impl Action {
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        let action = match path {
            "" | "/site" | "/site/index" => Action::Index,
            "/site/login" => Action::Login,
            "/site/logout" => Action::Logout,
            "/site/contact" => Action::Contact,
            "/site/signup" => Action::Signup,
            "/site/request-password-reset" => Action::RequestPasswordReset,
            "/site/reset-password" => Action::ResetPassword,
            "/site/verify-email" => Action::VerifyEmail,
            "/site/resend-verification-email" => Action::ResendVerificationEmail,
            "/site/error" => Action::Error,
            _ => return None,
        };
        Some(action)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Index => "index",
            Action::Login => "login",
            Action::Logout => "logout",
            Action::Contact => "contact",
            Action::Signup => "signup",
            Action::RequestPasswordReset => "request-password-reset",
            Action::ResetPassword => "reset-password",
            Action::VerifyEmail => "verify-email",
            Action::ResendVerificationEmail => "resend-verification-email",
            Action::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SponsorView {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for SponsorView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// View model handed to the front end.
#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub view: &'static str,
    pub layout: &'static str,
    pub model: serde_json::Value,
    pub errors: FormErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<Option<SponsorView>>,
    pub flashes: Vec<Flash>,
}

impl View {
    pub fn new(view: &'static str) -> Self {
        Self {
            view,
            layout: "main",
            model: serde_json::Value::Null,
            errors: FormErrors::new(),
            sponsor: None,
            flashes: Vec::new(),
        }
    }

    pub fn layout(mut self, layout: &'static str) -> Self {
        self.layout = layout;
        self
    }

    pub fn model<T: Serialize>(mut self, model: &T) -> Result<Self> {
        self.model = serde_json::to_value(model)?;
        Ok(self)
    }

    pub fn errors(mut self, errors: &FormErrors) -> Self {
        self.errors = errors.clone();
        self
    }

    /// Attach the resolved sponsor; `None` still renders as `null`.
    pub fn sponsor(mut self, sponsor: Option<&User>) -> Self {
        self.sponsor = Some(sponsor.map(SponsorView::from));
        self
    }
}

#[derive(Debug)]
pub enum Outcome {
    Render(View),
    Redirect(String),
}

impl Outcome {
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Outcome::Redirect(url) => Some(url),
            Outcome::Render(_) => None,
        }
    }

    pub fn into_response(self, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut builder = match &self {
            Outcome::Render(_) => HttpResponse::Ok(),
            Outcome::Redirect(_) => HttpResponse::SeeOther(),
        };
        for cookie in cookies {
            builder.cookie(cookie);
        }
        match self {
            Outcome::Render(view) => builder.json(view),
            Outcome::Redirect(url) => builder.insert_header((header::LOCATION, url)).finish(),
        }
    }
}

/// Request-scoped state passed to every controller action.
#[derive(Debug)]
pub struct RequestContext {
    session: SessionHandle,
    method: Method,
    url: String,
    cookies: HashMap<String, String>,
    outgoing: Vec<Cookie<'static>>,
}

impl RequestContext {
    pub fn new(session: SessionHandle, method: Method, url: impl Into<String>) -> Self {
        Self {
            session,
            method,
            url: url.into(),
            cookies: HashMap::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    pub fn from_request_parts(session: SessionHandle, req: &HttpRequest) -> Self {
        let url = match req.uri().path_and_query() {
            Some(pq) => pq.as_str().to_string(),
            None => req.path().to_string(),
        };
        let mut ctx = Self::new(session, req.method().clone(), url);
        if let Ok(cookies) = req.cookies() {
            for cookie in cookies.iter() {
                ctx.cookies
                    .insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
        ctx
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn is_guest(&self) -> bool {
        self.session.state.is_guest()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.session.state.user_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, cookie: Cookie<'static>) {
        self.outgoing.push(cookie);
    }

    pub fn outgoing_cookies(&self) -> &[Cookie<'static>] {
        &self.outgoing
    }

    /// Bind `user` to the session under a fresh session id.
    pub fn login(&mut self, user: &User, remember: bool) {
        self.session.regenerate();
        self.session.state.user_id = Some(user.id);
        self.session.state.remember = remember;
    }

    /// Drop the session. Returns whether a user was logged in.
    pub fn logout(&mut self) -> bool {
        let was_logged_in = !self.is_guest();
        self.session.destroy();
        was_logged_in
    }

    pub fn flash(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.session.state.add_flash(kind, message);
    }

    /// Remember the current URL so a later login can return to it. Only GET
    /// requests are remembered.
    pub fn remember_url(&mut self) {
        if self.method == Method::GET {
            self.session.state.return_url = Some(self.url.clone());
        }
    }

    pub fn go_home(&self) -> Outcome {
        Outcome::Redirect(HOME_URL.to_string())
    }

    /// Redirect to the URL remembered before login, or home.
    pub fn go_back(&mut self) -> Outcome {
        let url = self
            .session
            .state
            .return_url
            .take()
            .unwrap_or_else(|| HOME_URL.to_string());
        Outcome::Redirect(url)
    }

    pub fn refresh(&self) -> Outcome {
        Outcome::Redirect(self.url.clone())
    }

    /// Render `view`, consuming the queued flashes.
    pub fn render(&mut self, mut view: View) -> Outcome {
        view.flashes = self.session.state.take_flashes();
        Outcome::Render(view)
    }

    /// Commit the session and turn the outcome into a response.
    pub async fn respond(self, outcome: Outcome, sessions: &SessionManager) -> Result<HttpResponse> {
        let mut cookies = self.outgoing;
        if let Some(cookie) = sessions.commit(self.session).await? {
            cookies.push(cookie);
        }
        Ok(outcome.into_response(cookies))
    }
}

impl FromRequest for RequestContext {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            // Access control normally loads the session already.
            let loaded = req.extensions_mut().remove::<SessionHandle>();
            let session = match loaded {
                Some(session) => session,
                None => {
                    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
                        AppError::Internal("application state is not configured".into())
                    })?;
                    let cookie = req.cookie(state.sessions.cookie_name());
                    state
                        .sessions
                        .load(cookie.as_ref().map(|c| c.value()))
                        .await?
                }
            };
            Ok::<_, actix_web::Error>(RequestContext::from_request_parts(session, &req))
        })
    }
}
