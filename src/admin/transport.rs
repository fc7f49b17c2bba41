//! Admin HTTP endpoints.
//!
//! Exposes endpoints for:
//! - Logging in with the admin secret (sets the session cookie)
//! - Logging out
//! - Listing and deleting stored messages (session required)

use crate::admin::AdminGate;
use crate::db::{Message, MessageRepo, Session};
use crate::error::{AppError, AppResult};
use crate::web::AppState;
use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Path, State},
    http::request::Parts,
    routing::{delete, get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Name of the signed session cookie
pub const SESSION_COOKIE: &str = "inbox_session";

/// Login request body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub secret: Option<String>,
}

/// Response for login endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub authenticated: bool,
}

/// Response for message listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub success: bool,
    pub messages: Vec<Message>,
}

/// Plain success envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Session id carried by the request, if its cookie has a valid signature.
pub struct SessionCookie {
    pub jar: SignedCookieJar,
    pub session_id: Option<String>,
}

impl FromRequestParts<AppState> for SessionCookie {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::<Key>::from_request_parts(parts, state).await?;
        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string());
        Ok(Self { jar, session_id })
    }
}

/// Extractor for privileged handlers. Resolving it runs the admin gate, so
/// a handler taking it never executes for an unauthorized caller.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie = SessionCookie::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});
        let session = state.gate.require(cookie.session_id.as_deref()).await?;
        Ok(Self(session))
    }
}

fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.session_id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Handler: POST /admin/login
///
/// Checks the admin secret and, on success, issues a new session cookie.
async fn login(
    State(state): State<AppState>,
    cookie: SessionCookie,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(SignedCookieJar, Json<LoginResponse>)> {
    let request = payload
        .map(|Json(request)| request)
        .map_err(|_| AppError::InvalidSecret)?;

    let session = state
        .gate
        .login(cookie.session_id.as_deref(), request.secret.as_deref())
        .await?;

    let jar = cookie
        .jar
        .add(session_cookie(&session, state.secure_cookies));
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            authenticated: true,
        }),
    ))
}

/// Handler: POST /admin/logout
async fn logout(
    State(state): State<AppState>,
    cookie: SessionCookie,
) -> AppResult<(SignedCookieJar, Json<SuccessResponse>)> {
    state.gate.logout(cookie.session_id.as_deref()).await?;
    let jar = cookie
        .jar
        .remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, SuccessResponse::ok()))
}

/// Handler: GET /admin/messages
async fn list_messages(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> AppResult<Json<MessagesResponse>> {
    let messages = MessageRepo::list(&state.pool).await?;
    Ok(Json(MessagesResponse {
        success: true,
        messages,
    }))
}

/// Handler: DELETE /admin/messages/{id}
async fn delete_message(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    MessageRepo::delete(&state.pool, &id).await?;
    info!("Admin deleted message {}", id);
    Ok(SuccessResponse::ok())
}

/// Create the admin router, to be nested under `/admin`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/messages", get(list_messages))
        .route("/messages/{id}", delete(delete_message))
}

/// Periodically purge expired sessions until the process exits.
pub async fn run_session_cleanup(gate: std::sync::Arc<AdminGate>, every: std::time::Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if let Err(e) = gate.purge_expired().await {
            tracing::warn!("Session cleanup failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::MemorySessionStore;
    use crate::db::{setup_test_db, NewMessage};
    use crate::web::derive_cookie_key;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::sync::Arc;

    async fn test_state() -> AppState {
        let gate = AdminGate::new(
            "hunter2",
            Arc::new(MemorySessionStore::new()),
            chrono::Duration::hours(1),
        );
        AppState {
            pool: setup_test_db().await,
            gate: Arc::new(gate),
            cookie_key: derive_cookie_key("0123456789abcdef0123456789abcdef"),
            secure_cookies: false,
            max_field_length: 100,
        }
    }

    fn no_cookie(state: &AppState) -> SessionCookie {
        SessionCookie {
            jar: SignedCookieJar::new(state.cookie_key.clone()),
            session_id: None,
        }
    }

    #[tokio::test]
    async fn test_login_wrong_secret() {
        let state = test_state().await;
        let request = LoginRequest {
            secret: Some("nope".to_string()),
        };
        let cookie = no_cookie(&state);
        let Err(err) = login(State(state), cookie, Ok(Json(request))).await else {
            panic!("login with a wrong secret succeeded");
        };
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_sets_signed_cookie() {
        let state = test_state().await;
        let request = LoginRequest {
            secret: Some("hunter2".to_string()),
        };
        let cookie = no_cookie(&state);
        let (jar, Json(body)) = login(State(state.clone()), cookie, Ok(Json(request)))
            .await
            .unwrap();

        assert!(body.success);
        let session_id = jar.get(SESSION_COOKIE).unwrap().value().to_string();
        assert!(state.gate.authorize(Some(&session_id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let state = test_state().await;
        let session = state.gate.login(None, Some("hunter2")).await.unwrap();
        let cookie = SessionCookie {
            jar: SignedCookieJar::new(state.cookie_key.clone()),
            session_id: Some(session.session_id.clone()),
        };

        let (jar, _) = logout(State(state.clone()), cookie).await.unwrap();
        assert!(jar.get(SESSION_COOKIE).is_none());
        assert!(!state.gate.authorize(Some(&session.session_id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_unknown_message() {
        let state = test_state().await;
        let session = state.gate.login(None, Some("hunter2")).await.unwrap();

        let result = delete_message(
            AdminSession(session),
            State(state),
            Path("missing".to_string()),
        )
        .await;
        let resp = result.unwrap_err().into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_messages() {
        let state = test_state().await;
        let session = state.gate.login(None, Some("hunter2")).await.unwrap();
        MessageRepo::create(
            &state.pool,
            NewMessage {
                name: "A".to_string(),
                email: "a@x.com".to_string(),
                message: "hi".to_string(),
            },
        )
        .await
        .unwrap();

        let Json(body) = list_messages(AdminSession(session), State(state)).await.unwrap();
        assert!(body.success);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].message, "hi");
    }
}
