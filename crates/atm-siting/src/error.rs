use crate::config::ConfigError;
use crate::ingest::LoadError;
use crate::scoring::ScoreError;
use crate::service::SitingError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Siting(SitingError),
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Siting(err) => siting_status(err),
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn siting_status(err: &SitingError) -> StatusCode {
    match err {
        SitingError::Resolve(_) => StatusCode::NOT_FOUND,
        SitingError::Load(LoadError::SourceNotFound { .. }) => StatusCode::NOT_FOUND,
        SitingError::Load(LoadError::Schema { .. })
        | SitingError::Load(LoadError::Encoding { .. })
        | SitingError::Load(LoadError::Geojson { .. }) => StatusCode::BAD_REQUEST,
        SitingError::Load(LoadError::Io { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        SitingError::Score(ScoreError::InsufficientData { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        SitingError::Score(ScoreError::InvalidWeight { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        SitingError::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Siting(err) => write!(f, "{}", err),
            AppError::BadRequest(message) => write!(f, "bad request: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Siting(err) => Some(err),
            AppError::BadRequest(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<SitingError> for AppError {
    fn from(value: SitingError) -> Self {
        Self::Siting(value)
    }
}
