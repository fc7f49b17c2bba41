use crate::admin::AdminGate;
use crate::db::DbPool;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

/// Domain separation string for the cookie signing key
const COOKIE_KEY_CONTEXT: &str = "contact-inbox 2024 session cookie signing key";

/// Application state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub gate: Arc<AdminGate>,
    pub cookie_key: Key,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    /// Per-field character limit for submissions
    pub max_field_length: usize,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the 64-byte cookie signing key from the configured session secret.
pub fn derive_cookie_key(session_secret: &str) -> Key {
    let mut material = [0u8; 64];
    blake3::Hasher::new_derive_key(COOKIE_KEY_CONTEXT)
        .update(session_secret.as_bytes())
        .finalize_xof()
        .fill(&mut material);
    Key::from(&material[..])
}
