use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{SessionData, SessionError, SessionId, SessionStore};

#[derive(Debug, Clone)]
struct SessionRecord {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

impl SessionRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Keeps sessions in process memory. Everything is lost on restart.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
    ttl: chrono::Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of records currently held, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Ids of every live session
    pub async fn session_ids(&self) -> Vec<SessionId> {
        let now = Utc::now();
        let mut ids: Vec<SessionId> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(_, record)| !record.is_expired(now))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, SessionError> {
        let sessions = self.sessions.read().await;

        Ok(sessions
            .get(id)
            .filter(|record| !record.is_expired(Utc::now()))
            .map(|record| record.data.clone()))
    }

    async fn save(&self, id: &SessionId, data: SessionData) -> Result<(), SessionError> {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| SessionError::Backend(format!("session ttl {} overflows", self.ttl)))?;
        let record = SessionRecord { data, expires_at };
        self.sessions.write().await.insert(*id, record);

        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), SessionError> {
        self.sessions.write().await.remove(id);

        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, SessionError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(now));

        Ok(before - sessions.len())
    }
}
