//! Iris classifier web interface
//!
//! An HTML form (`GET /`, `POST /predict`) and a small JSON API
//! (`POST /api/predict`, `GET /api/model`, `GET /api/health`) over one model
//! artifact loaded at startup and shared read-only across requests.

mod html;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use iris_core::errors::ArtifactError;
use iris_core::{IrisError, MetricsRecord, Prediction, Predictor, RawInput};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, warn};

pub use html::escape_html;

/// Immutable per-process state: the loaded artifact and, when available, the
/// metrics of the run that produced it.
pub struct AppState {
    predictor: Predictor,
    metrics: Option<MetricsRecord>,
    model_path: PathBuf,
    metrics_path: PathBuf,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Load the artifact (required) and the metrics record (optional).
    pub fn load(model_path: &Path, metrics_path: &Path) -> Result<Self, ArtifactError> {
        let predictor = Predictor::load(model_path)?;
        let metrics = match MetricsRecord::load(metrics_path) {
            Ok(metrics) => Some(metrics),
            Err(err) => {
                warn!("Metrics unavailable ({}); sidebar will omit accuracy", err);
                None
            }
        };
        Ok(Self::new(predictor, metrics, model_path, metrics_path))
    }

    pub fn new(predictor: Predictor, metrics: Option<MetricsRecord>, model_path: &Path, metrics_path: &Path) -> Self {
        Self {
            predictor,
            metrics,
            model_path: model_path.to_path_buf(),
            metrics_path: metrics_path.to_path_buf(),
        }
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn metrics(&self) -> Option<&MetricsRecord> {
        self.metrics.as_ref()
    }
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(api_predict))
        .route("/api/model", get(api_model))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    problems: Vec<String>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
    problems: Vec<String>,
}

impl From<IrisError> for ApiError {
    fn from(err: IrisError) -> Self {
        match err {
            IrisError::Input(input) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: input.to_string(),
                problems: input.problems.iter().map(ToString::to_string).collect(),
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: other.to_string(),
                problems: Vec::new(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
            problems: Vec::new(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
            problems: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
            problems: self.problems,
        });
        (self.status, payload).into_response()
    }
}

async fn index(State(state): State<SharedState>) -> Html<String> {
    Html(html::render_page(&state, &html::default_fields(), None))
}

async fn predict_form(
    State(state): State<SharedState>,
    Form(raw): Form<HashMap<String, String>>,
) -> (StatusCode, Html<String>) {
    let fields: BTreeMap<String, String> = raw.into_iter().collect();
    let outcome = state.predictor.predict(&RawInput::Form(fields.clone()), true);

    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(IrisError::Input(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if let Err(err) = &outcome {
        debug!("Form prediction rejected: {}", err);
    }

    (status, Html(html::render_page(&state, &fields, Some(&outcome))))
}

#[derive(Debug, Deserialize)]
struct PredictParams {
    #[serde(default = "default_probs")]
    probs: bool,
}

fn default_probs() -> bool {
    true
}

async fn api_predict(
    State(state): State<SharedState>,
    params: Result<Query<PredictParams>, QueryRejection>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Query(params) = params?;
    let Json(body) = body?;
    let input = RawInput::from_json(body).map_err(IrisError::from)?;
    let prediction = state.predictor.predict(&input, params.probs)?;
    Ok(Json(prediction))
}

#[derive(Debug, Serialize)]
struct MetricsSummary {
    accuracy: f64,
    test_size: f64,
    shuffle: bool,
    random_state: u64,
    n_train: usize,
    n_test: usize,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    algorithm: &'static str,
    feature_columns: Vec<String>,
    base_keys: Vec<String>,
    species_to_int: BTreeMap<String, u32>,
    int_to_species: BTreeMap<u32, String>,
    checksum: Option<String>,
    model_path: String,
    metrics: Option<MetricsSummary>,
}

async fn api_model(State(state): State<SharedState>) -> Json<ModelInfo> {
    let artifact = state.predictor.artifact();
    let codec = artifact.codec();

    Json(ModelInfo {
        algorithm: "Gaussian Naive Bayes",
        feature_columns: artifact.feature_columns().to_vec(),
        base_keys: state.predictor.base_keys().to_vec(),
        species_to_int: codec.species_to_int().clone(),
        int_to_species: codec.int_to_species().clone(),
        checksum: artifact.checksum().ok(),
        model_path: state.model_path.display().to_string(),
        metrics: state.metrics.as_ref().map(|m| MetricsSummary {
            accuracy: m.accuracy,
            test_size: m.test_size,
            shuffle: m.shuffle,
            random_state: m.random_state,
            n_train: m.n_train,
            n_test: m.n_test,
        }),
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "iris-web"
    }))
}
