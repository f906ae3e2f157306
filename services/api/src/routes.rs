use crate::infra::{blocking, AppState, ViewportQuery};
use atm_siting::error::AppError;
use atm_siting::layers::{AtmSite, CompetitorSite, PointOfInterest, PopulationPoint};
use atm_siting::{CommuneAssessment, SiteScoringService};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

const POPULATION_PAGE: usize = 20;
const POI_PAGE: usize = 300;

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreQuery {
    pub(crate) lat: Option<f64>,
    pub(crate) lng: Option<f64>,
    pub(crate) commune: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lookup {
    Coordinate { lat: f64, lng: f64 },
    Key(String),
}

impl ScoreQuery {
    /// Exactly one of `lat`+`lng` or `commune`.
    pub(crate) fn lookup(self) -> Result<Lookup, AppError> {
        let commune = self.commune.filter(|value| !value.trim().is_empty());
        match (self.lat, self.lng, commune) {
            (Some(lat), Some(lng), None) => Ok(Lookup::Coordinate { lat, lng }),
            (None, None, Some(key)) => Ok(Lookup::Key(key)),
            (None, None, None) => Err(AppError::BadRequest(
                "provide lat and lng, or commune".to_string(),
            )),
            (_, _, Some(_)) => Err(AppError::BadRequest(
                "lat/lng and commune are mutually exclusive".to_string(),
            )),
            _ => Err(AppError::BadRequest(
                "lat and lng must be supplied together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PopulationListResponse {
    pub(crate) population: Vec<PopulationPoint>,
    pub(crate) total_count: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct PoiListResponse {
    pub(crate) pois: Vec<PointOfInterest>,
    pub(crate) total_count: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompetitorListResponse {
    pub(crate) competitors: Vec<CompetitorSite>,
    pub(crate) total_count: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct AtmListResponse {
    pub(crate) atms: Vec<AtmSite>,
    pub(crate) total_count: usize,
}

pub(crate) fn siting_router(service: SiteScoringService) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/communes/score", get(score_endpoint))
        .route("/api/v1/communes/:key/feature", get(commune_feature_endpoint))
        .route("/api/v1/layers/population", get(population_endpoint))
        .route("/api/v1/layers/pois", get(poi_endpoint))
        .route("/api/v1/layers/competitors", get(competitors_endpoint))
        .route("/api/v1/layers/atms", get(atms_endpoint))
        .route("/api/v1/data/reload", post(reload_endpoint))
        .with_state(service)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn score_endpoint(
    State(service): State<SiteScoringService>,
    Query(query): Query<ScoreQuery>,
) -> Result<Json<CommuneAssessment>, AppError> {
    let lookup = query.lookup()?;
    let assessment = blocking(move || match lookup {
        Lookup::Coordinate { lat, lng } => service.score_by_coordinate(lat, lng),
        Lookup::Key(key) => service.score_by_key(&key),
    })
    .await?;

    Ok(Json(assessment))
}

pub(crate) async fn commune_feature_endpoint(
    State(service): State<SiteScoringService>,
    Path(key): Path<String>,
) -> Result<Json<geojson::Feature>, AppError> {
    let feature = blocking(move || service.commune_feature(&key)).await?;
    Ok(Json(feature))
}

pub(crate) async fn population_endpoint(
    State(service): State<SiteScoringService>,
    Query(query): Query<ViewportQuery>,
) -> Result<Json<PopulationListResponse>, AppError> {
    let bbox = query.bounding_box()?;
    let page = query.page_request(POPULATION_PAGE)?;
    let listing = blocking(move || service.population_in(bbox, page)).await?;

    Ok(Json(PopulationListResponse {
        population: listing.items,
        total_count: listing.total_count,
    }))
}

pub(crate) async fn poi_endpoint(
    State(service): State<SiteScoringService>,
    Query(query): Query<ViewportQuery>,
) -> Result<Json<PoiListResponse>, AppError> {
    let bbox = query.bounding_box()?;
    let page = query.page_request(POI_PAGE)?;
    let listing = blocking(move || service.pois_in(bbox, page)).await?;

    Ok(Json(PoiListResponse {
        pois: listing.items,
        total_count: listing.total_count,
    }))
}

pub(crate) async fn competitors_endpoint(
    State(service): State<SiteScoringService>,
) -> Result<Json<CompetitorListResponse>, AppError> {
    let competitors = blocking(move || service.competitors()).await?;
    let total_count = competitors.len();

    Ok(Json(CompetitorListResponse {
        competitors,
        total_count,
    }))
}

pub(crate) async fn atms_endpoint(
    State(service): State<SiteScoringService>,
) -> Result<Json<AtmListResponse>, AppError> {
    let atms = blocking(move || service.atms()).await?;
    let total_count = atms.len();

    Ok(Json(AtmListResponse { atms, total_count }))
}

pub(crate) async fn reload_endpoint(
    State(service): State<SiteScoringService>,
) -> Json<serde_json::Value> {
    service.reload();
    Json(json!({ "status": "reloaded" }))
}
