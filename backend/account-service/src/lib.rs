// Account Service Library

pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod session;


pub use error::{AppError, Result};

use std::sync::Arc;

use config::Config;
use controller::SiteController;
use db::UserRepository;
use services::{AccountMailer, MailSettings, Mailer};
use session::{SessionManager, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub controller: Arc<SiteController>,
    pub sessions: SessionManager,
}

impl AppState {
    /// Wire the site controller and session manager around the given backends.
    pub fn new(
        config: Config,
        users: Arc<dyn UserRepository>,
        mailer: Arc<dyn Mailer>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        let config = Arc::new(config);
        let account_mailer = AccountMailer::new(mailer, MailSettings::from_config(&config));
        let sessions = SessionManager::new(
            session_store,
            config.session.clone(),
            config.site.remember_me_duration,
        );

        AppState {
            controller: Arc::new(SiteController::new(users, account_mailer, config.clone())),
            config,
            sessions,
        }
    }
}
