use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::task;

use geofence_predictor::aoi::AoiStore;
use geofence_predictor::config::ServiceConfig;
use geofence_predictor::error::Error;
use geofence_predictor::model::{discover_model_dir, InferenceEngine};
use geofence_predictor::pipeline::PredictionPipeline;
use geofence_predictor::store::TrajectoryStore;
use geofence_predictor::types::{AoiRecord, PredictionResult, TrajectoryPoint};

// ---------- Server state ----------

#[derive(Clone)]
struct AppState {
    pipeline: Arc<PredictionPipeline>,
    store: Arc<TrajectoryStore>,
    aois: Arc<AoiStore>,
    infer_timeout: Duration,
}

// ---------- Error mapping ----------

type ErrorReply = (StatusCode, Json<serde_json::Value>);

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::AoiNotFound { .. } => StatusCode::NOT_FOUND,
        Error::StoreUnavailable { .. } | Error::EngineClosed => StatusCode::SERVICE_UNAVAILABLE,
        Error::InferenceTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        Error::ModelNotFound { .. } | Error::Serialization { .. } | Error::Inference { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn reply_err(e: Error) -> ErrorReply {
    (status_for(&e), Json(json!({ "error": e.to_string() })))
}

// ---------- Blocking pipeline dispatch ----------

/// Run one pipeline job on the blocking pool under the ingest deadline.
/// A forward pass cannot be interrupted: on timeout the worker finishes in
/// the background and its result is dropped.
async fn score_on_worker<F>(state: &AppState, job: F) -> Result<f32, Error>
where
    F: FnOnce(&PredictionPipeline) -> Result<f32, Error> + Send + 'static,
{
    let pipeline = state.pipeline.clone();
    let worker = task::spawn_blocking(move || job(&pipeline));
    match tokio::time::timeout(state.infer_timeout, worker).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(Error::Inference {
            reason: format!("scoring task failed: {join}"),
        }),
        Err(_) => Err(Error::InferenceTimeout {
            ms: state.infer_timeout.as_millis() as u64,
        }),
    }
}

// ---------- Handlers ----------

async fn add_point(
    State(state): State<AppState>,
    Path(object_id): Path<String>,
    Json(point): Json<TrajectoryPoint>,
) -> Result<Json<PredictionResult>, ErrorReply> {
    let probability = score_on_worker(&state, move |p| p.process_point(&object_id, &point))
        .await
        .map_err(reply_err)?;
    Ok(Json(PredictionResult { probability }))
}

async fn add_batch(
    State(state): State<AppState>,
    Path(object_id): Path<String>,
    Json(points): Json<Vec<TrajectoryPoint>>,
) -> Result<Json<PredictionResult>, ErrorReply> {
    let probability = score_on_worker(&state, move |p| p.process_batch(&object_id, &points))
        .await
        .map_err(reply_err)?;
    Ok(Json(PredictionResult { probability }))
}

async fn latest(
    State(state): State<AppState>,
    Path(object_id): Path<String>,
) -> Result<Json<Vec<TrajectoryPoint>>, ErrorReply> {
    let points = state.store.window(&object_id).map_err(reply_err)?;
    Ok(Json(points))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAoi {
    name: String,
    polygon_wkt: String,
}

async fn create_aoi(
    State(state): State<AppState>,
    Json(req): Json<CreateAoi>,
) -> Result<Json<AoiRecord>, ErrorReply> {
    let record = state
        .aois
        .create(&req.name, &req.polygon_wkt)
        .map_err(reply_err)?;
    Ok(Json(record))
}

async fn list_aois(State(state): State<AppState>) -> Result<Json<Vec<AoiRecord>>, ErrorReply> {
    let records = state.aois.list_all().map_err(reply_err)?;
    Ok(Json(records))
}

// ---------- Startup ----------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = ServiceConfig::from_env();

    // The process must not serve without a model.
    let model_dir = discover_model_dir(cfg.model_dir.as_deref())?;
    let engine = Arc::new(InferenceEngine::load(&model_dir)?);

    let store = Arc::new(TrajectoryStore::open(&cfg.db_path)?);
    let aois = Arc::new(AoiStore::open(&cfg.db_path)?);
    let pipeline = Arc::new(PredictionPipeline::new(store.clone(), engine.clone()));

    let state = AppState {
        pipeline,
        store,
        aois,
        infer_timeout: Duration::from_millis(cfg.infer_timeout_ms),
    };

    let app = Router::new()
        .route("/api/trajectory/:object_id/add", post(add_point))
        .route("/api/trajectory/:object_id/add-batch", post(add_batch))
        .route("/api/trajectory/:object_id/latest", get(latest))
        .route("/api/aoi", post(create_aoi).get(list_aois))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.close();
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
