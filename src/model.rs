//! Frozen geofence classifier: artifact discovery plus TorchScript loading
//! and synchronous inference.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tch::{CModule, Device, IndexOp, Tensor};

use crate::error::{Error, Result};
use crate::types::WINDOW_SIZE;

/// File that marks a candidate directory as a valid model export.
const MODEL_MARKER: &str = "model.pt";

/// Fixed search order for the exported model directory.
const CANDIDATE_DIRS: [&str; 3] = [
    "exported_geofence_model",
    "/app/exported_geofence_model",
    "models/exported_geofence_model",
];

/// Scores one assembled window.
pub trait Classifier: Send + Sync {
    /// `window` must hold exactly `WINDOW_SIZE` `(lat, lon)` pairs in
    /// chronological order. Returns the approach probability.
    fn predict(&self, window: &[(f32, f32)]) -> Result<f32>;
}

/// Resolve the model directory: the override first (if any), then the fixed
/// candidate list, then next to the executable. A candidate is valid only if
/// it contains the marker file.
pub fn discover_model_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = override_dir {
        candidates.push(dir.to_path_buf());
    }
    candidates.extend(CANDIDATE_DIRS.iter().map(PathBuf::from));
    if let Ok(mut exe) = std::env::current_exe() {
        exe.pop();
        exe.push("exported_geofence_model");
        candidates.push(exe);
    }
    pick_valid(&candidates)
}

fn pick_valid(candidates: &[PathBuf]) -> Result<PathBuf> {
    for dir in candidates {
        if dir.is_dir() && dir.join(MODEL_MARKER).is_file() {
            return Ok(dir.clone());
        }
    }
    Err(Error::ModelNotFound {
        tried: candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

enum EngineState {
    Ready(CModule),
    Closed,
}

/// Owns the loaded frozen classifier for the life of the process.
///
/// A successful `load` yields a ready engine; `close` retires it. A failed
/// load is terminal (no engine value exists). The loaded module is never
/// mutated; concurrent `predict` calls share it through read guards.
pub struct InferenceEngine {
    state: RwLock<EngineState>,
    device: Device,
}

impl InferenceEngine {
    /// Load the TorchScript artifact from `dir` and verify it with a warmup
    /// forward pass: the output of a zero window must have shape `[1, 1]`.
    pub fn load(dir: &Path) -> Result<Self> {
        let device = Device::Cpu;
        let artifact = dir.join(MODEL_MARKER);
        let model = CModule::load_on_device(&artifact, device).map_err(|e| Error::Inference {
            reason: format!("failed to load TorchScript {}: {e}", artifact.display()),
        })?;

        let warmup = flatten_window(&[(0.0, 0.0); WINDOW_SIZE])?;
        forward(&model, &warmup, device)?;
        tracing::info!("loaded model {}; warmup forward ok", artifact.display());

        Ok(Self {
            state: RwLock::new(EngineState::Ready(model)),
            device,
        })
    }

    /// Release the model handle. Idempotent; the drop happens exactly once
    /// and `predict` fails with [`Error::EngineClosed`] afterwards.
    pub fn close(&self) {
        let mut state = self.state.write();
        if let EngineState::Ready(_) = &*state {
            *state = EngineState::Closed;
            tracing::info!("inference engine closed");
        }
    }
}

impl Classifier for InferenceEngine {
    fn predict(&self, window: &[(f32, f32)]) -> Result<f32> {
        let flat = flatten_window(window)?;
        let state = self.state.read();
        match &*state {
            EngineState::Ready(model) => forward(model, &flat, self.device),
            EngineState::Closed => Err(Error::EngineClosed),
        }
    }
}

/// Validate the window shape and flatten it into the dense buffer the model
/// takes: `[batch=1, time=WINDOW_SIZE, feature=2]`, row-major, lat before
/// lon.
fn flatten_window(window: &[(f32, f32)]) -> Result<Vec<f32>> {
    if window.len() != WINDOW_SIZE {
        return Err(Error::InvalidInput {
            expected: WINDOW_SIZE,
            got: window.len(),
        });
    }
    let mut flat = Vec::with_capacity(WINDOW_SIZE * 2);
    for (lat, lon) in window {
        flat.push(*lat);
        flat.push(*lon);
    }
    Ok(flat)
}

/// One forward pass through the module's single entrypoint. The input and
/// output tensors are scope-bound and release on every exit path.
fn forward(model: &CModule, flat: &[f32], device: Device) -> Result<f32> {
    let input = Tensor::from_slice(flat)
        .reshape([1, WINDOW_SIZE as i64, 2])
        .to_device(device);
    let output = model.forward_ts(&[input]).map_err(|e| Error::Inference {
        reason: e.to_string(),
    })?;
    let size = output.size();
    if size.len() != 2 || size[0] != 1 || size[1] != 1 {
        return Err(Error::Inference {
            reason: format!("unexpected output shape {size:?}, want [1, 1]"),
        });
    }
    Ok(output.i((0, 0)).double_value(&[]) as f32)
}
