//! Geofence approach prediction. Ingested points accumulate in a bounded
//! insertion-ordered history per object; every full 20-point window is
//! scored by a frozen TorchScript classifier on the ingest path.

pub mod aoi;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod store;
pub mod types;
pub mod window;
