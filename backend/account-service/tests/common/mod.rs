use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::web;
use std::sync::Arc;

use account_service::{
    config::Config,
    db::InMemoryUserRepository,
    models::{User, UserStatus},
    security::hash_password,
    services::LogMailer,
    session::MemorySessionStore,
    AppState,
};

pub const PASSWORD: &str = "SecurePass123!";

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub users: Arc<InMemoryUserRepository>,
    pub mail_log: Arc<LogMailer>,
    pub sessions: Arc<MemorySessionStore>,
}

pub fn test_app(config: Config, users: Vec<User>) -> TestApp {
    let users = Arc::new(InMemoryUserRepository::with_users(users));
    let mail_log = Arc::new(LogMailer::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let state = AppState::new(config, users.clone(), mail_log.clone(), sessions.clone());

    TestApp {
        state: web::Data::new(state),
        users,
        mail_log,
        sessions,
    }
}

pub fn user(username: &str, status: UserStatus) -> User {
    User::new(
        username,
        &format!("{}@example.com", username),
        hash_password(PASSWORD).expect("hash password"),
        status,
    )
}

pub fn cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.into_owned())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> Option<String> {
    resp.headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
