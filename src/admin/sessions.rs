//! Session storage behind the admin gate.
//!
//! The gate only sees the [`SessionStore`] trait. Production uses the
//! SQLite-backed store so logins survive restarts; tests and throwaway
//! deployments use the in-memory one.

use crate::db::{DbPool, Session, SessionRepo};
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

/// Persistence for admin sessions, keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session. Expired sessions are returned as-is; callers decide.
    async fn load(&self, session_id: &str) -> AppResult<Option<Session>>;

    /// Insert or replace a session.
    async fn save(&self, session: &Session) -> AppResult<()>;

    /// Remove a session. Removing an unknown id is not an error.
    async fn remove(&self, session_id: &str) -> AppResult<()>;

    /// Drop every expired session, returning how many were removed.
    async fn cleanup_expired(&self) -> AppResult<u64>;
}

/// Shared session store handle for use across the application.
pub type SharedSessionStore = Arc<dyn SessionStore>;

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> AppResult<Option<Session>> {
        Ok(self.sessions.get(session_id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, session: &Session) -> AppResult<()> {
        self.sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> AppResult<()> {
        self.sessions.remove(session_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> AppResult<u64> {
        let now = Utc::now();
        // Counted inside retain: the map may grow concurrently
        let mut removed = 0u64;
        self.sessions.retain(|_, session| {
            let keep = !session.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

/// Session store backed by the `admin_sessions` table.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: DbPool,
}

impl SqliteSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, session_id: &str) -> AppResult<Option<Session>> {
        SessionRepo::get_by_session_id(&self.pool, session_id).await
    }

    async fn save(&self, session: &Session) -> AppResult<()> {
        SessionRepo::save(&self.pool, session).await
    }

    async fn remove(&self, session_id: &str) -> AppResult<()> {
        SessionRepo::delete(&self.pool, session_id).await
    }

    async fn cleanup_expired(&self) -> AppResult<u64> {
        SessionRepo::cleanup_expired(&self.pool).await
    }
}
