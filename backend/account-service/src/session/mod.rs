//! Browser sessions
//!
//! A session carries the logged-in identity, the URL a guest was trying to
//! reach before being sent to the login page, and a queue of one-shot flash
//! messages. State lives server-side in a [`SessionStore`]; the browser only
//! holds an opaque id in an HttpOnly cookie.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::security::token;

pub mod memory_store;
pub mod redis_store;

pub use memory_store::MemorySessionStore;
pub use redis_store::RedisSessionStore;

const SESSION_ID_LEN: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub user_id: Option<Uuid>,
    pub return_url: Option<String>,
    #[serde(default)]
    pub flashes: Vec<Flash>,
    /// Extended lifetime requested at login.
    #[serde(default)]
    pub remember: bool,
}

impl SessionState {
    pub fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }

    /// Nothing worth persisting.
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.return_url.is_none() && self.flashes.is_empty()
    }

    pub fn add_flash(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.flashes.push(Flash {
            kind,
            message: message.into(),
        });
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SessionState>>;

    async fn save(&self, id: &str, state: &SessionState, ttl: Duration) -> Result<()>;

    async fn destroy(&self, id: &str) -> Result<()>;
}

/// Session bound to one request.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: String,
    pub state: SessionState,
    persisted: bool,
    stale_id: Option<String>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            id: token::generate_random_string(SESSION_ID_LEN),
            state: SessionState::default(),
            persisted: false,
            stale_id: None,
        }
    }

    pub fn restored(id: String, state: SessionState) -> Self {
        Self {
            id,
            state,
            persisted: true,
            stale_id: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Move the state to a fresh id; the old id is destroyed on commit.
    pub fn regenerate(&mut self) {
        let old = std::mem::replace(&mut self.id, token::generate_random_string(SESSION_ID_LEN));
        if self.persisted {
            self.stale_id = Some(old);
        }
        self.persisted = false;
    }

    /// Drop all state and move to a fresh id.
    pub fn destroy(&mut self) {
        self.state = SessionState::default();
        self.regenerate();
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads and commits sessions around a request.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
    remember_ttl: u64,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig, remember_ttl: u64) -> Self {
        Self {
            store,
            config,
            remember_ttl,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Restore the session named by the cookie, or start a new one.
    pub async fn load(&self, cookie_value: Option<&str>) -> Result<SessionHandle> {
        if let Some(id) = cookie_value.filter(|id| !id.is_empty()) {
            if let Some(state) = self.store.load(id).await? {
                return Ok(SessionHandle::restored(id.to_string(), state));
            }
            tracing::debug!("session cookie refers to an unknown or expired session");
        }
        Ok(SessionHandle::new())
    }

    /// Persist the session and return the cookie the response must carry.
    pub async fn commit(&self, handle: SessionHandle) -> Result<Option<Cookie<'static>>> {
        if let Some(stale) = handle.stale_id.as_deref() {
            self.store.destroy(stale).await?;
        }

        if handle.state.is_empty() {
            if handle.persisted {
                self.store.destroy(&handle.id).await?;
            }
            if handle.persisted || handle.stale_id.is_some() {
                let mut removal = self.cookie(String::new(), None);
                removal.make_removal();
                return Ok(Some(removal));
            }
            return Ok(None);
        }

        let ttl = if handle.state.remember {
            self.remember_ttl
        } else {
            self.config.ttl_secs
        };
        self.store
            .save(&handle.id, &handle.state, Duration::from_secs(ttl))
            .await?;

        let max_age = handle.state.remember.then_some(ttl);
        Ok(Some(self.cookie(handle.id, max_age)))
    }

    fn cookie(&self, value: String, max_age: Option<u64>) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.config.cookie_name.clone(), value)
            .path("/")
            .http_only(true)
            .secure(self.config.secure_cookie)
            .same_site(SameSite::Lax)
            .finish();
        if let Some(secs) = max_age {
            cookie.set_max_age(CookieDuration::seconds(secs as i64));
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (SessionManager, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(store.clone(), SessionConfig::default(), 3600);
        (manager, store)
    }

    #[tokio::test]
    async fn empty_new_session_is_not_persisted() {
        let (manager, store) = manager();
        let handle = manager.load(None).await.unwrap();

        let cookie = manager.commit(handle).await.unwrap();
        assert!(cookie.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn flash_survives_round_trip() {
        let (manager, _store) = manager();
        let mut handle = manager.load(None).await.unwrap();
        handle.state.add_flash(FlashKind::Success, "saved");
        let id = handle.id().to_string();

        let cookie = manager.commit(handle).await.unwrap().unwrap();
        assert_eq!(cookie.name(), "_session");
        assert_eq!(cookie.value(), id);
        assert_eq!(cookie.http_only(), Some(true));

        let mut restored = manager.load(Some(&id)).await.unwrap();
        let flashes = restored.state.take_flashes();
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].kind, FlashKind::Success);
    }

    #[tokio::test]
    async fn regenerate_destroys_previous_id() {
        let (manager, store) = manager();
        let mut handle = manager.load(None).await.unwrap();
        handle.state.return_url = Some("/site/contact".into());
        let first_id = handle.id().to_string();
        manager.commit(handle).await.unwrap();

        let mut handle = manager.load(Some(&first_id)).await.unwrap();
        handle.state.user_id = Some(Uuid::new_v4());
        handle.regenerate();
        let second_id = handle.id().to_string();
        manager.commit(handle).await.unwrap();

        assert_ne!(first_id, second_id);
        assert!(store.load(&first_id).await.unwrap().is_none());
        assert!(store.load(&second_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn destroyed_empty_session_clears_cookie() {
        let (manager, store) = manager();
        let mut handle = manager.load(None).await.unwrap();
        handle.state.user_id = Some(Uuid::new_v4());
        let id = handle.id().to_string();
        manager.commit(handle).await.unwrap();

        let mut handle = manager.load(Some(&id)).await.unwrap();
        handle.destroy();
        let cookie = manager.commit(handle).await.unwrap().unwrap();

        assert_eq!(cookie.value(), "");
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn remembered_session_gets_max_age() {
        let (manager, _store) = manager();
        let mut handle = manager.load(None).await.unwrap();
        handle.state.user_id = Some(Uuid::new_v4());
        handle.state.remember = true;

        let cookie = manager.commit(handle).await.unwrap().unwrap();
        assert_eq!(cookie.max_age(), Some(CookieDuration::seconds(3600)));
    }

    #[tokio::test]
    async fn unknown_cookie_starts_new_session() {
        let (manager, _store) = manager();
        let handle = manager.load(Some("does-not-exist")).await.unwrap();
        assert_ne!(handle.id(), "does-not-exist");
        assert!(handle.state.is_guest());
    }
}
