//! HTTP front-ends: REST API, Swagger-documented API and the web UI.

use crate::config::ServerConfig;
use crate::error::TtsError;
use crate::language::LanguageCode;
use crate::runtime::{Runtime, SynthesisRequest, SystemInfo};
use crate::voice::{all_voices, VoiceInfo};
use crate::{openapi, web};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const MODEL_NAME: &str = "Kokoro-82M";
pub const DEFAULT_MAX_CONCURRENT: usize = 50;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared handler state: the runtime plus the synthesis admission limits.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<Runtime>,
    synthesis_slots: Arc<Semaphore>,
    synthesis_timeout: Duration,
}

impl AppState {
    pub fn new(runtime: Arc<Runtime>, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            runtime,
            synthesis_slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
            synthesis_timeout: timeout,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub voices: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub voices: VoiceInfo,
    pub system: SystemInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// JSON body accepted by `/tts` and `/tts/generate`.
#[derive(Debug, Default, Deserialize)]
pub struct TtsPayload {
    pub text: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<f32>,
    pub language: Option<String>,
}

impl TtsPayload {
    pub fn into_request(self) -> Result<SynthesisRequest, TtsError> {
        let text = self
            .text
            .ok_or_else(|| TtsError::invalid_input("text field is required"))?;
        let language = self
            .language
            .as_deref()
            .map(LanguageCode::from_code)
            .transpose()?;

        let mut request = SynthesisRequest::new(text).language(language);
        if let Some(voice) = self.voice {
            request = request.voice(voice);
        }
        if let Some(speed) = self.speed {
            request = request.speed(speed);
        }
        Ok(request)
    }
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Rejected request: {}", self);
        }
        let body = ErrorResponse {
            error: self.message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body. A missing or unparseable body reports the same
/// "text field is required" error as a missing field; a body with fields of
/// the wrong type reports what was wrong.
pub(crate) fn parse_payload(
    payload: Result<Json<TtsPayload>, JsonRejection>,
) -> Result<SynthesisRequest, TtsError> {
    match payload {
        Ok(Json(payload)) => payload.into_request(),
        Err(JsonRejection::JsonDataError(rejection)) => {
            warn!("Invalid TTS payload: {}", rejection.body_text());
            Err(TtsError::invalid_input(rejection.body_text()))
        }
        Err(rejection) => {
            warn!("Unreadable TTS payload: {}", rejection.body_text());
            Err(TtsError::invalid_input("text field is required"))
        }
    }
}

/// Run synthesis on the blocking pool and return WAV bytes.
///
/// Waiting for a slot counts against the request timeout. The slot's permit
/// moves into the blocking task, so an engine call that outlives its timed-out
/// request still occupies a slot until it returns.
pub(crate) async fn synthesize_wav(
    state: &AppState,
    request: SynthesisRequest,
) -> Result<Vec<u8>, TtsError> {
    let runtime = Arc::clone(&state.runtime);
    let slots = Arc::clone(&state.synthesis_slots);
    let synthesis = async move {
        let permit = slots.acquire_owned().await.map_err(|err| TtsError::Internal {
            message: format!("Synthesis slots closed: {}", err),
        })?;
        let bytes = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            runtime.generate_wav(&request)
        })
        .await
        .map_err(|err| TtsError::Internal {
            message: format!("Synthesis task failed: {}", err),
        })??;
        Ok::<Vec<u8>, TtsError>(bytes)
    };

    match tokio::time::timeout(state.synthesis_timeout, synthesis).await {
        Ok(result) => result,
        Err(_) => Err(TtsError::Internal {
            message: format!(
                "Synthesis timed out after {}s",
                state.synthesis_timeout.as_secs_f32()
            ),
        }),
    }
}

pub(crate) fn wav_attachment(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

pub(crate) fn health_body() -> HealthResponse {
    HealthResponse {
        status: "ok".to_string(),
        model: MODEL_NAME.to_string(),
    }
}

pub(crate) fn voices_body() -> VoicesResponse {
    VoicesResponse {
        voices: all_voices().into_iter().map(String::from).collect(),
    }
}

async fn health() -> Json<HealthResponse> {
    Json(health_body())
}

async fn voices() -> Json<VoicesResponse> {
    Json(voices_body())
}

async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        voices: state.runtime.voice_info(),
        system: state.runtime.system_info(),
    })
}

async fn text_to_speech(
    State(state): State<AppState>,
    payload: Result<Json<TtsPayload>, JsonRejection>,
) -> Result<Response, TtsError> {
    let request = parse_payload(payload)?;
    let bytes = synthesize_wav(&state, request).await?;
    Ok(wav_attachment(bytes, "output.wav"))
}

fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/voices", get(voices))
        .route("/info", get(info))
        .route("/tts", post(text_to_speech))
        .merge(openapi::routes())
        .merge(web::routes())
        .with_state(state)
}

/// Every route with default limits and no middleware; used directly by tests.
pub fn router(runtime: Arc<Runtime>) -> Router {
    routes(AppState::new(
        runtime,
        DEFAULT_MAX_CONCURRENT,
        DEFAULT_REQUEST_TIMEOUT,
    ))
}

/// Router with the configured synthesis limits plus tracing and CORS.
pub fn app(runtime: Arc<Runtime>, config: &ServerConfig) -> Router {
    let state = AppState::new(runtime, config.max_connections, config.request_timeout());
    routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

async fn preload(runtime: &Arc<Runtime>, codes: &[String]) {
    for code in codes {
        let language = match LanguageCode::from_code(code) {
            Ok(language) => language,
            Err(err) => {
                warn!("Skipping preload: {}", err);
                continue;
            }
        };
        let runtime = Arc::clone(runtime);
        match tokio::task::spawn_blocking(move || runtime.warmup(language)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("Preloading language {} failed: {}", language, err),
            Err(err) => warn!("Preload task for {} failed: {}", language, err),
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let runtime = Arc::new(Runtime::new(config.engine.loader()));
    preload(&runtime, &config.preload).await;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow::anyhow!("Failed to bind {}: {}", addr, err))?;
    info!("Kokoro TTS server listening on http://{}", addr);
    info!("Web UI: http://{}/  Swagger UI: http://{}/docs", addr, addr);
    info!(
        backend = ?config.engine.backend,
        max_connections = config.max_connections,
        timeout_secs = config.request_timeout_secs,
        "Server settings"
    );

    axum::serve(listener, app(runtime, &config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| anyhow::anyhow!("Server error: {}", err))
}
