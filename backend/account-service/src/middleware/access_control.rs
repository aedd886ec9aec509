use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpMessage,
};
use futures::future::{ready, Ready};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::controller::{Action, Outcome, LOGIN_URL};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Guest on a members-only action.
    LoginRequired,
    /// Verb not accepted; carries the value of the `Allow` header.
    MethodNotAllowed(String),
}

/// Who may call which action, and with which verbs.
#[derive(Debug, Clone)]
pub struct AccessRules {
    anonymous: HashSet<Action>,
    verbs: HashMap<Action, Vec<Method>>,
}

impl AccessRules {
    /// Rules of the site controller: everything but the account entry points
    /// needs a logged-in user, and logout only answers POST.
    pub fn site() -> Self {
        let anonymous = [
            Action::Login,
            Action::Signup,
            Action::RequestPasswordReset,
            Action::ResetPassword,
            Action::VerifyEmail,
            Action::ResendVerificationEmail,
            Action::Error,
        ]
        .into_iter()
        .collect();

        let mut verbs = HashMap::new();
        verbs.insert(Action::Logout, vec![Method::POST]);

        Self { anonymous, verbs }
    }

    pub fn allows_guest(&self, action: Action) -> bool {
        self.anonymous.contains(&action)
    }

    /// Access is checked before the verb.
    pub fn check(&self, action: Action, is_guest: bool, method: &Method) -> AccessDecision {
        if is_guest && !self.allows_guest(action) {
            return AccessDecision::LoginRequired;
        }

        match self.verbs.get(&action) {
            Some(allowed) if !allowed.contains(method) => AccessDecision::MethodNotAllowed(
                allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => AccessDecision::Allow,
        }
    }
}

impl Default for AccessRules {
    fn default() -> Self {
        Self::site()
    }
}

/// Access control middleware
///
/// Loads the session for site actions and stores it in the request
/// extensions for [`crate::controller::RequestContext`]. Guests hitting a
/// members-only page are sent to the login page; a GET request is remembered
/// as the return URL.
pub struct AccessControl {
    rules: Rc<AccessRules>,
}

impl AccessControl {
    pub fn new(rules: AccessRules) -> Self {
        Self {
            rules: Rc::new(rules),
        }
    }
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::new(AccessRules::site())
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessControl
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AccessControlService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessControlService {
            service: Rc::new(service),
            rules: self.rules.clone(),
        }))
    }
}

pub struct AccessControlService<S> {
    service: Rc<S>,
    rules: Rc<AccessRules>,
}

impl<S, B> Service<ServiceRequest> for AccessControlService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let rules = self.rules.clone();

        Box::pin(async move {
            let Some(action) = Action::from_path(req.path()) else {
                return service.call(req).await.map(|res| res.map_into_left_body());
            };

            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| AppError::Internal("application state is not configured".into()))?;
            let cookie = req.cookie(state.sessions.cookie_name());
            let mut session = state
                .sessions
                .load(cookie.as_ref().map(|c| c.value()))
                .await?;

            match rules.check(action, session.state.is_guest(), req.method()) {
                AccessDecision::Allow => {
                    req.extensions_mut().insert(session);
                    service.call(req).await.map(|res| res.map_into_left_body())
                }
                AccessDecision::LoginRequired => {
                    tracing::debug!(action = action.as_str(), "guest redirected to login");
                    if req.method() == Method::GET {
                        session.state.return_url = Some(
                            req.uri()
                                .path_and_query()
                                .map(|pq| pq.as_str().to_string())
                                .unwrap_or_else(|| req.path().to_string()),
                        );
                    }

                    let mut cookies = Vec::new();
                    if let Some(cookie) = state.sessions.commit(session).await? {
                        cookies.push(cookie);
                    }
                    let response = Outcome::Redirect(LOGIN_URL.to_string()).into_response(cookies);
                    Ok(req.into_response(response).map_into_right_body())
                }
                AccessDecision::MethodNotAllowed(allowed) => {
                    tracing::debug!(action = action.as_str(), method = %req.method(), "verb rejected");
                    Ok(req
                        .error_response(AppError::MethodNotAllowed(allowed))
                        .map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guests_only_reach_account_entry_points() {
        let rules = AccessRules::site();
        for action in [Action::Index, Action::Contact, Action::Logout] {
            assert_eq!(
                rules.check(action, true, &Method::GET),
                AccessDecision::LoginRequired,
                "{} should require login",
                action.as_str()
            );
        }
        for action in [Action::Login, Action::Signup, Action::VerifyEmail, Action::Error] {
            assert_eq!(rules.check(action, true, &Method::GET), AccessDecision::Allow);
        }
    }

    #[test]
    fn logout_is_post_only() {
        let rules = AccessRules::site();
        assert_eq!(
            rules.check(Action::Logout, false, &Method::GET),
            AccessDecision::MethodNotAllowed("POST".into())
        );
        assert_eq!(
            rules.check(Action::Logout, false, &Method::POST),
            AccessDecision::Allow
        );
    }

    #[test]
    fn access_is_checked_before_verb() {
        let rules = AccessRules::site();
        assert_eq!(
            rules.check(Action::Logout, true, &Method::GET),
            AccessDecision::LoginRequired
        );
    }
}
