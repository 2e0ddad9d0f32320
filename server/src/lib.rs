use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use sb_ai::cards::{generate_cards, refine_outcome};
use sb_ai::gemini::GeminiClient;
use sb_ai::images::wikimedia::WikimediaImages;
use sb_ai::images::{resolve_card_images, ImageResolver, NoImages};
use sb_ai::llm::gemini_llm::GeminiLlm;
use sb_ai::llm::Llm;
use sb_core::domain::{Card, CardsPayload, RefinementResult};
use sb_core::error::{AppError, REQUEST_BODY_INVALID};
use sb_core::export::{export_json, export_pdf, PdfExport};
use sb_core::validate::{require_draft, require_outcome};

pub mod config;

use config::Config;

/// Shared by every request. Immutable after startup.
pub struct AppState {
    pub llm: Arc<dyn Llm>,
    pub images: Arc<dyn ImageResolver>,
    pub model: String,
}

impl AppState {
    pub fn from_config(cfg: &Config) -> Result<Self, AppError> {
        let client = GeminiClient::new(&cfg.base_url, cfg.api_key.clone())?;
        let images: Arc<dyn ImageResolver> = if cfg.image_lookup {
            Arc::new(WikimediaImages::default())
        } else {
            log::info!("Image lookup disabled");
            Arc::new(NoImages)
        };
        Ok(Self {
            llm: Arc::new(GeminiLlm::new(client)),
            images,
            model: cfg.model.clone(),
        })
    }
}

/// `AppError` rendered as an HTTP response: 400 for caller mistakes, 500 otherwise.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self(AppError::new(REQUEST_BODY_INVALID, "Invalid request body").with_details(e.body_text()))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error) = if err.is_client_error() {
            (StatusCode::BAD_REQUEST, err.message.clone())
        } else {
            log::error!("{}: {}", err, err.details.as_deref().unwrap_or(""));
            (StatusCode::INTERNAL_SERVER_ERROR, err.user_message())
        };
        (status, Json(ErrorBody { error, code: err.code })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Run a blocking provider call off the async runtime.
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            AppError::new("TASK_FAILED", "Background task failed").with_details(e.to_string())
        })?
        .map_err(ApiError)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    commit: Option<&'static str>,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_HASH"),
    })
}

#[derive(Debug, Deserialize)]
struct GenerateCardsRequest {
    #[serde(default)]
    outcome: Option<String>,
}

async fn generate_cards_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateCardsRequest>, JsonRejection>,
) -> ApiResult<Json<CardsPayload>> {
    let Json(req) = body?;
    // Validated here so a blank outcome never occupies a blocking thread.
    let outcome = require_outcome(req.outcome.as_deref())?;

    let payload = blocking(move || {
        let mut payload = generate_cards(state.llm.as_ref(), &state.model, &outcome)?;
        let found = resolve_card_images(&mut payload.cards, state.images.as_ref());
        log::info!("Resolved {found}/{} card images", payload.cards.len());
        Ok(payload)
    })
    .await?;
    Ok(Json(payload))
}

#[derive(Debug, Deserialize)]
struct RefineOutcomeRequest {
    #[serde(default)]
    draft: Option<String>,
}

async fn refine_outcome_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RefineOutcomeRequest>, JsonRejection>,
) -> ApiResult<Json<RefinementResult>> {
    let Json(req) = body?;
    let draft = require_draft(req.draft.as_deref())?;

    let result = blocking(move || refine_outcome(state.llm.as_ref(), &state.model, &draft)).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportRequest {
    #[serde(default)]
    outcome: String,
    #[serde(default)]
    cards: Vec<Card>,
    #[serde(default, deserialize_with = "selection_ids")]
    selected_ids: BTreeSet<String>,
}

/// Selection ids arrive as strings or integers.
fn selection_ids<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Int(i64),
        Text(String),
    }

    Ok(Vec::<IdRepr>::deserialize(deserializer)?
        .into_iter()
        .map(|id| match id {
            IdRepr::Int(n) => n.to_string(),
            IdRepr::Text(s) => s,
        })
        .collect())
}

async fn export_json_handler(
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = body?;
    let export = export_json(
        &req.outcome,
        &req.cards,
        &req.selected_ids,
        OffsetDateTime::now_utc(),
    )?;
    log::info!("Exported {} as JSON", export.filename);

    let headers = [
        (header::CONTENT_TYPE, "application/json".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export.filename),
        ),
    ];
    Ok((headers, export.contents).into_response())
}

async fn export_pdf_handler(
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> ApiResult<Json<PdfExport>> {
    let Json(req) = body?;
    let export = export_pdf(
        &req.outcome,
        &req.cards,
        &req.selected_ids,
        OffsetDateTime::now_utc(),
    )?;
    log::info!("Prepared {} for PDF rendering", export.filename);
    Ok(Json(export))
}

/// Build the application router. Non-API paths are served from `client_dir` when given.
pub fn router(state: AppState, client_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/generate-cards", post(generate_cards_handler))
        .route("/refine-outcome", post(refine_outcome_handler))
        .route("/export/json", post(export_json_handler))
        .route("/export/pdf", post(export_pdf_handler))
        .with_state(Arc::new(state));

    let app = Router::new().nest("/api", api);
    let app = match client_dir {
        Some(dir) => {
            log::info!("Serving client files from {}", dir.display());
            app.fallback_service(ServeDir::new(dir))
        }
        None => app,
    };
    app.layer(CorsLayer::permissive())
}
