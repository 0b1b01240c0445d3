use serde::{Deserialize, Serialize};

/// Number of points in one classification window.
pub const WINDOW_SIZE: usize = 20;

/// One geolocated observation of a tracked object. Immutable once created.
///
/// The stored/wire encoding is fixed to exactly these three fields; decoding
/// rejects unknown or missing fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrajectoryPoint {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: i64,
}

/// Scalar output of one pipeline run. Nominally in [0, 1] but passed through
/// from the classifier unvalidated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability: f32,
}

/// A monitored area. `inside` is set at creation time; nothing in this
/// service updates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AoiRecord {
    pub id: String,
    pub name: String,
    pub polygon_wkt: String,
    pub inside: bool,
}
