//! Commune indicator loading, normalization and composite scoring for ATM
//! site selection.

pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod layers;
pub mod scoring;
pub mod service;
pub mod spatial;
pub mod telemetry;

pub use service::{CommuneAssessment, LayerStatus, SiteScoringService, SitingError};
