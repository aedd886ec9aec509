use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{SessionState, SessionStore};
use crate::error::Result;

/// Session store kept in process memory. Sessions are lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, (SessionState, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionState>> {
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some((state, expires_at)) if *expires_at > Instant::now() => {
                    return Ok(Some(state.clone()));
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.sessions.write().await.remove(id);
        }
        Ok(None)
    }

    async fn save(&self, id: &str, state: &SessionState, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (_, expires_at)| *expires_at > now);
        sessions.insert(id.to_string(), (state.clone(), now + ttl));
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
