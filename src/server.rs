//! HTTP control surface: axum router and request handlers.
//!
//! Handlers translate requests into Status Controller calls and serialize
//! the current state back out. The controller is synchronous and joins the
//! previous animation before returning, so every state-changing handler
//! hops onto the blocking pool: the request blocks on the previous
//! animation's clean termination, the runtime does not.

use crate::color::Color;
use crate::controller::{Snapshot, StatusController};
use crate::error::LightError;
use crate::{color, controller};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<StatusController>,
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        api_on,
        api_off,
        api_switch,
        api_available,
        api_busy,
        api_away,
        api_reset,
        api_rainbow,
        api_status,
    ),
    components(schemas(SwitchRequest, RainbowRequest, Snapshot, controller::Status)),
    tags(
        (name = "status", description = "Presence status control endpoints"),
    ),
    info(
        title = "Presence Light API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for a presence status light"
    )
)]
pub struct ApiDoc;

// ── Request types ────────────────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SwitchRequest {
    /// Red channel (0-255); required
    red: Option<u8>,
    /// Green channel (0-255); required
    green: Option<u8>,
    /// Blue channel (0-255); required
    blue: Option<u8>,
    /// Global brightness (0.0-1.0)
    #[schema(example = 0.5, default = 0.5)]
    brightness: Option<f32>,
    /// Blink half-period in seconds; solid color when absent
    speed: Option<f32>,
}

#[derive(Default, Deserialize, utoipa::ToSchema)]
pub struct RainbowRequest {
    /// Global brightness (0.0-1.0)
    #[schema(example = 0.5, default = 0.5)]
    brightness: Option<f32>,
    /// Seconds between frames
    #[schema(example = 0.01, default = 0.01)]
    speed: Option<f32>,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/on", get(api_on).post(api_on))
        .route("/api/off", get(api_off).post(api_off))
        .route("/api/switch", post(api_switch))
        .route("/api/available", get(api_available).post(api_available))
        .route("/api/busy", get(api_busy).post(api_busy))
        .route("/api/away", get(api_away).post(api_away))
        .route("/api/reset", get(api_reset).post(api_reset))
        .route("/api/rainbow", get(api_rainbow).post(api_rainbow))
        .route("/api/status", get(api_status))
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handler plumbing ─────────────────────────────────────────────────

type ApiError = (StatusCode, Json<Value>);

fn internal_error(message: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message.into() })),
    )
}

/// Controller calls join the previous animation, so they run on the
/// blocking pool rather than the async runtime.
async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> T + Send + 'static,
) -> Result<T, ApiError> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|_| internal_error("controller task failed"))
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET/POST /api/on — random hue, full saturation/value; overrides any pin
#[utoipa::path(
    post,
    path = "/api/on",
    tag = "status",
    responses((status = 200, description = "Light switched on"))
)]
async fn api_on(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    run_blocking(move || state.controller.switch_on("/api/on")).await?;
    Ok(Json(json!({})))
}

/// GET/POST /api/off — clear and power down; fires the Off webhook
#[utoipa::path(
    post,
    path = "/api/off",
    tag = "status",
    responses((status = 200, description = "Light switched off"))
)]
async fn api_off(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    run_blocking(move || state.controller.switch_off("/api/off")).await?;
    Ok(Json(json!({})))
}

/// POST /api/switch — set a solid or blinking color; ignored while pinned
#[utoipa::path(
    post,
    path = "/api/switch",
    tag = "status",
    request_body = SwitchRequest,
    responses(
        (status = 200, description = "Color applied"),
        (status = 500, description = "red, green or blue missing"),
    )
)]
async fn api_switch(
    State(state): State<AppState>,
    Json(req): Json<SwitchRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(red), Some(green), Some(blue)) = (req.red, req.green, req.blue) else {
        return Err(internal_error(LightError::MissingField.to_string()));
    };

    run_blocking(move || {
        state.controller.set_status(
            Color::new(red, green, blue),
            req.brightness,
            req.speed,
            false,
            "/api/switch",
        );
    })
    .await?;
    Ok(Json(json!({})))
}

/// GET/POST /api/available — pinned canonical green; fires its webhook
#[utoipa::path(
    post,
    path = "/api/available",
    tag = "status",
    responses((status = 200, description = "Status pinned to Available"))
)]
async fn api_available(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    run_blocking(move || {
        state
            .controller
            .set_status(color::AVAILABLE, None, None, true, "/api/available");
    })
    .await?;
    Ok(Json(json!({})))
}

/// GET/POST /api/busy — pinned canonical red; fires its webhook
#[utoipa::path(
    post,
    path = "/api/busy",
    tag = "status",
    responses((status = 200, description = "Status pinned to Busy"))
)]
async fn api_busy(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    run_blocking(move || {
        state
            .controller
            .set_status(color::BUSY, None, None, true, "/api/busy");
    })
    .await?;
    Ok(Json(json!({})))
}

/// GET/POST /api/away — pinned canonical yellow; fires its webhook
#[utoipa::path(
    post,
    path = "/api/away",
    tag = "status",
    responses((status = 200, description = "Status pinned to Away"))
)]
async fn api_away(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    run_blocking(move || {
        state
            .controller
            .set_status(color::AWAY, None, None, true, "/api/away");
    })
    .await?;
    Ok(Json(json!({})))
}

/// GET/POST /api/reset — clear the pin flag only
#[utoipa::path(
    post,
    path = "/api/reset",
    tag = "status",
    responses((status = 200, description = "Pin flag cleared"))
)]
async fn api_reset(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    run_blocking(move || state.controller.reset()).await?;
    Ok(Json(json!({})))
}

/// GET/POST /api/rainbow — optional `{brightness, speed}` body
#[utoipa::path(
    post,
    path = "/api/rainbow",
    tag = "status",
    request_body = RainbowRequest,
    responses((status = 200, description = "Rainbow started"))
)]
async fn api_rainbow(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    // absent or malformed bodies fall back to defaults rather than erroring
    let req: RainbowRequest = serde_json::from_slice(&body).unwrap_or_default();
    run_blocking(move || {
        state
            .controller
            .set_rainbow(req.brightness, req.speed, "/api/rainbow");
    })
    .await?;
    Ok(Json(json!({})))
}

/// GET /api/status — current state snapshot
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "status",
    responses((status = 200, description = "Current controller state", body = Snapshot))
)]
async fn api_status(State(state): State<AppState>) -> Result<Json<Snapshot>, ApiError> {
    let snapshot = run_blocking(move || state.controller.snapshot()).await?;
    Ok(Json(snapshot))
}

async fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

// ── Tests ────────────────────────────────────────────────────────────
