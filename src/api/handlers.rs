//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    CatalogResponse, ConfirmRequest, CreateSessionRequest, CreateSessionResponse, ErrorResponse,
    LanguageRequest, QueuedResponse, SuccessResponse, TextRequest,
};
use super::AppState;
use crate::i18n::{catalog, Language};
use crate::runtime::{Command, SessionError, SessionSnapshot};
use crate::transcript::ImageBlob;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let max_image_bytes = state.max_image_bytes;

    Router::new()
        // Localized strings for the client chrome
        .route("/api/i18n/:language", get(get_catalog))
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/end", post(end_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // User actions
        .route(
            "/api/sessions/:id/image",
            post(submit_image).layer(DefaultBodyLimit::max(max_image_bytes)),
        )
        .route("/api/sessions/:id/confirm", post(confirm_social_posts))
        .route("/api/sessions/:id/text", post(submit_text))
        .route("/api/sessions/:id/language", post(set_language))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Catalog
// ============================================================

async fn get_catalog(Path(code): Path<String>) -> Result<Json<CatalogResponse>, AppError> {
    let language = parse_language(&code)?;
    let messages = catalog(language)
        .into_iter()
        .map(|(id, text)| (id.key(), text))
        .collect();

    Ok(Json(CatalogResponse { language, messages }))
}

// ============================================================
// Session Lifecycle
// ============================================================

/// The body is optional; a missing or non-JSON one means all defaults
async fn create_session(
    State(state): State<AppState>,
    req: Option<Json<CreateSessionRequest>>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let req = req.map(|Json(req)| req).unwrap_or_default();
    let language = req.language.as_deref().map(parse_language).transpose()?;

    let (session_id, handle) = state.sessions.create(language).await;
    let snapshot = handle.snapshot().await?;

    Ok(Json(CreateSessionResponse {
        session_id,
        snapshot,
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.sessions.snapshot(&id).await?))
}

async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.end(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (snapshot, broadcast_rx) = state.sessions.subscribe(&id).await?;
    Ok(sse_stream(snapshot, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn submit_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<QueuedResponse>, AppError> {
    let content_type = image_content_type(&headers).ok_or_else(|| {
        AppError::BadRequest("Only image uploads are accepted".to_string())
    })?;

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(format!(
                "Image exceeds {} bytes",
                state.max_image_bytes
            ))
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    })?;

    let image = ImageBlob::new(body.to_vec(), content_type);
    if image.is_empty() {
        return Err(AppError::BadRequest("Image is empty".to_string()));
    }

    state.sessions.send(&id, Command::SubmitImage(image)).await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn confirm_social_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    state
        .sessions
        .send(&id, Command::ConfirmSocialPosts(req.choice))
        .await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn submit_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TextRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    state
        .sessions
        .send(&id, Command::SubmitText(req.text))
        .await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn set_language(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<LanguageRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    let language = parse_language(&req.language)?;
    state
        .sessions
        .send(&id, Command::SetLanguage(language))
        .await?;
    Ok(Json(QueuedResponse { queued: true }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("caption-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Helpers
// ============================================================

fn parse_language(code: &str) -> Result<Language, AppError> {
    Language::parse(code)
        .ok_or_else(|| AppError::BadRequest(format!("Unsupported language: {code}")))
}

/// The upload's media type, if it is `image/*`
fn image_content_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let media_type = value.split(';').next()?.trim().to_ascii_lowercase();
    let subtype = media_type.strip_prefix("image/")?;
    if subtype.is_empty() {
        None
    } else {
        Some(media_type)
    }
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::NotFound(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
