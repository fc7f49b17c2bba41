use crate::admin::admin_router;
use crate::db::{MessageRepo, MessageSubmission};
use crate::error::{AppError, AppResult};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Response for an accepted submission
#[derive(Debug, Serialize, Deserialize)]
pub struct SendResponse {
    pub success: bool,
    pub id: String,
}

/// Accept a contact-form submission
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<MessageSubmission>, JsonRejection>,
) -> AppResult<Json<SendResponse>> {
    let Json(submission) =
        payload.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    let new_message = submission.validate(state.max_field_length)?;

    let message = MessageRepo::create(&state.pool, new_message).await?;
    info!("Accepted message {}", message.id);

    Ok(Json(SendResponse {
        success: true,
        id: message.id,
    }))
}

/// Create the web router. Paths outside the API fall through to
/// `static_dir` when one is configured.
pub fn create_router(state: AppState, static_dir: Option<&str>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/health", get(health))
        .route("/send", post(send_message))
        .nest("/admin", admin_router())
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).layer(cors)
}
