//! The admin gate: shared-secret login and per-session authorization.

use crate::admin::sessions::SharedSessionStore;
use crate::db::Session;
use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Decides whether a caller may list or delete messages.
pub struct AdminGate {
    /// Configured admin secret
    secret: Zeroizing<String>,
    sessions: SharedSessionStore,
    /// Lifetime of a session issued at login
    ttl: Duration,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>, sessions: SharedSessionStore, ttl: Duration) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
            sessions,
            ttl,
        }
    }

    /// Constant-time comparison against the configured secret.
    /// An empty secret on either side never matches.
    fn verify_secret(&self, candidate: &str) -> bool {
        if self.secret.is_empty() || candidate.is_empty() {
            return false;
        }
        bool::from(self.secret.as_bytes().ct_eq(candidate.as_bytes()))
    }

    /// Exchange the admin secret for an authenticated session.
    ///
    /// On success a fresh session id is issued and the caller's previous
    /// session, if any, is discarded. On failure nothing is touched.
    pub async fn login(
        &self,
        current_session: Option<&str>,
        candidate: Option<&str>,
    ) -> AppResult<Session> {
        if !self.verify_secret(candidate.unwrap_or_default()) {
            warn!("Admin login rejected");
            return Err(AppError::InvalidSecret);
        }

        let mut session = Session::new(self.ttl);
        session.authenticated = true;
        self.sessions.save(&session).await?;

        if let Some(previous) = current_session {
            self.sessions.remove(previous).await?;
        }

        info!("Admin session established, expires at {}", session.expires_at);
        Ok(session)
    }

    /// Whether the session is authenticated and unexpired. Never mutates state.
    /// Storage failures are returned as errors, not as `false`.
    pub async fn authorize(&self, session_id: Option<&str>) -> AppResult<bool> {
        match self.require(session_id).await {
            Ok(_) => Ok(true),
            Err(AppError::AuthRequired) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Like [`authorize`](Self::authorize), but yields the session or an
    /// authorization error.
    pub async fn require(&self, session_id: Option<&str>) -> AppResult<Session> {
        let Some(session_id) = session_id else {
            return Err(AppError::AuthRequired);
        };

        match self.sessions.load(session_id).await? {
            Some(session) if session.is_authorized_at(Utc::now()) => Ok(session),
            Some(_) => {
                debug!("Session {} is not authorized", short_id(session_id));
                Err(AppError::AuthRequired)
            }
            None => Err(AppError::AuthRequired),
        }
    }

    /// End a session. Unknown or missing sessions are ignored.
    pub async fn logout(&self, session_id: Option<&str>) -> AppResult<()> {
        if let Some(session_id) = session_id {
            self.sessions.remove(session_id).await?;
            info!("Admin session {} closed", short_id(session_id));
        }
        Ok(())
    }

    /// Remove expired sessions from the store.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let removed = self.sessions.cleanup_expired().await?;
        if removed > 0 {
            debug!("Purged {} expired admin sessions", removed);
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn short_id(session_id: &str) -> &str {
    session_id.get(..8).unwrap_or(session_id)
}
