//! Per-point orchestration: append, retrieve, assemble, infer.

use std::sync::Arc;

use crate::error::Result;
use crate::model::Classifier;
use crate::store::TrajectoryStore;
use crate::types::TrajectoryPoint;
use crate::window::assemble;

pub struct PredictionPipeline {
    store: Arc<TrajectoryStore>,
    classifier: Arc<dyn Classifier>,
}

impl PredictionPipeline {
    pub fn new(store: Arc<TrajectoryStore>, classifier: Arc<dyn Classifier>) -> Self {
        Self { store, classifier }
    }

    /// Ingest one point and return the approach probability.
    ///
    /// A fresh object scores `0.0` until its history fills one window; the
    /// classifier is not consulted before that. Any step failing aborts the
    /// call without rolling back the append.
    pub fn process_point(&self, object_id: &str, point: &TrajectoryPoint) -> Result<f32> {
        self.store.append(object_id, point)?;
        let raw = self.store.window(object_id)?;
        let Some(window) = assemble(raw) else {
            return Ok(0.0);
        };
        let probability = self.classifier.predict(&window.features())?;
        tracing::debug!("scored object={} p={:.4}", object_id, probability);
        Ok(probability)
    }

    /// Ingest `points` strictly in input order and return only the last
    /// point's probability; earlier results are computed and discarded, but
    /// their store mutations persist. A failing point aborts the remaining
    /// batch with no rollback of the points already appended. An empty batch
    /// scores `0.0`.
    pub fn process_batch(&self, object_id: &str, points: &[TrajectoryPoint]) -> Result<f32> {
        let mut last = 0.0;
        for point in points {
            last = self.process_point(object_id, point)?;
        }
        Ok(last)
    }
}
