//! Runtime settings, resolved from the environment once at startup.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listen address for the HTTP server.
    pub bind_addr: String,
    /// SQLite database file backing both stores.
    pub db_path: PathBuf,
    /// Optional model directory checked before the fixed candidates.
    pub model_dir: Option<PathBuf>,
    /// Deadline for one ingest pipeline run, milliseconds.
    pub infer_timeout_ms: u64,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            db_path: std::env::var("GEOFENCE_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("geofence.db")),
            model_dir: std::env::var("GEOFENCE_MODEL_DIR").ok().map(PathBuf::from),
            infer_timeout_ms: std::env::var("INFER_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2000),
        }
    }
}
