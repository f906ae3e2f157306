//! Facade combining the layer caches, the resolver and the scorer.

use crate::cache::{DataCatalog, TableCache};
use crate::config::DataConfig;
use crate::ingest::{LoadError, SourceInfo};
use crate::layers::{
    AtmSite, CompetitorSite, Indicator, IndicatorRow, LayerSource, PointOfInterest,
    PopulationPoint,
};
use crate::scoring::{self, ScoreError, ScoreResult, WeightScheme};
use crate::spatial::{resolver, BoundingBox, GeoPoint, Located, Page, PageRequest, ResolveError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SitingError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },
}

/// A resolved commune with its indicators and composite score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommuneAssessment {
    pub commune: String,
    pub commune_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub indicators: BTreeMap<Indicator, f64>,
    #[serde(flatten)]
    pub result: ScoreResult,
}

impl CommuneAssessment {
    fn new(row: &IndicatorRow, distance_km: Option<f64>, result: ScoreResult) -> Self {
        Self {
            commune: row.label().to_string(),
            commune_code: row.commune_code.clone(),
            latitude: row.latitude,
            longitude: row.longitude,
            distance_km,
            indicators: row.raw_values().clone(),
            result,
        }
    }
}

/// Load state of one configured layer.
#[derive(Debug, Clone, Serialize)]
pub struct LayerStatus {
    pub layer: &'static str,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LayerStatus {
    fn probe<T: LayerSource>(cache: &TableCache<T>, path: &Path) -> Self {
        match cache.load(path) {
            Ok(table) => Self {
                layer: T::LAYER,
                path: path.to_path_buf(),
                source: Some(table.source().clone()),
                error: None,
            },
            Err(err) => Self {
                layer: T::LAYER,
                path: path.to_path_buf(),
                source: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Site scoring over the configured reference layers.
#[derive(Clone)]
pub struct SiteScoringService {
    catalog: Arc<DataCatalog>,
    files: Arc<DataConfig>,
    weights: Arc<WeightScheme>,
}

impl SiteScoringService {
    pub fn new(files: DataConfig) -> Self {
        Self::with_catalog(files, Arc::new(DataCatalog::default()))
    }

    pub fn with_catalog(files: DataConfig, catalog: Arc<DataCatalog>) -> Self {
        Self {
            catalog,
            files: Arc::new(files),
            weights: Arc::new(WeightScheme::default()),
        }
    }

    pub fn with_weights(mut self, weights: WeightScheme) -> Self {
        self.weights = Arc::new(weights);
        self
    }

    pub fn files(&self) -> &DataConfig {
        &self.files
    }

    pub fn catalog(&self) -> &DataCatalog {
        &self.catalog
    }

    /// Score the commune whose centroid is nearest to `(lat, lng)`.
    pub fn score_by_coordinate(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<CommuneAssessment, SitingError> {
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
        if !(lat.is_finite() && lng.is_finite() && in_range) {
            return Err(SitingError::InvalidCoordinate { lat, lng });
        }

        let table = self.catalog.indicators.load(&self.files.indicators)?;
        let hit = resolver::nearest(table.rows(), GeoPoint::new(lat, lng))?;
        let result = scoring::score(hit.item, &self.weights)?;

        Ok(CommuneAssessment::new(hit.item, Some(hit.distance_km), result))
    }

    /// Score the commune matching `key` by name or code.
    pub fn score_by_key(&self, key: &str) -> Result<CommuneAssessment, SitingError> {
        let table = self.catalog.indicators.load(&self.files.indicators)?;
        let row = resolver::by_key(table.rows(), key)?;
        let result = scoring::score(row, &self.weights)?;

        Ok(CommuneAssessment::new(row, None, result))
    }

    pub fn population_in(
        &self,
        bbox: BoundingBox,
        page: PageRequest,
    ) -> Result<Page<PopulationPoint>, SitingError> {
        let table = self.catalog.indicators.load(&self.files.indicators)?;
        let matches = table
            .rows()
            .iter()
            .filter(|row| bbox.contains(&row.position()))
            .map(PopulationPoint::new);

        Ok(Page::collect(matches, page))
    }

    pub fn pois_in(
        &self,
        bbox: BoundingBox,
        page: PageRequest,
    ) -> Result<Page<PointOfInterest>, SitingError> {
        let table = self.catalog.poi.load(&self.files.poi)?;
        let matches = table
            .pois()
            .iter()
            .filter(|poi| bbox.contains(&poi.position()))
            .cloned();

        Ok(Page::collect(matches, page))
    }

    pub fn competitors(&self) -> Result<Vec<CompetitorSite>, SitingError> {
        let table = self.catalog.competitors.load(&self.files.competitors)?;
        Ok(table.sites().to_vec())
    }

    /// Existing ATM and agency network.
    pub fn atms(&self) -> Result<Vec<AtmSite>, SitingError> {
        let table = self.catalog.atms.load(&self.files.atms)?;
        Ok(table.sites().to_vec())
    }

    /// Boundary feature of a commune, matched by name or code.
    pub fn commune_feature(&self, key: &str) -> Result<geojson::Feature, SitingError> {
        let atlas = self.catalog.communes.load(&self.files.communes)?;
        atlas
            .find(key)
            .map(|commune| commune.feature.clone())
            .ok_or_else(|| {
                ResolveError::NotFound {
                    query: key.trim().to_string(),
                }
                .into()
            })
    }

    /// Drop every cached layer; the next call re-reads from disk.
    pub fn reload(&self) {
        self.catalog.invalidate_all();
        info!("reference layers invalidated");
    }

    /// Load every configured layer and report its provenance or failure.
    pub fn layer_status(&self) -> Vec<LayerStatus> {
        let statuses = vec![
            LayerStatus::probe(&self.catalog.indicators, &self.files.indicators),
            LayerStatus::probe(&self.catalog.competitors, &self.files.competitors),
            LayerStatus::probe(&self.catalog.poi, &self.files.poi),
            LayerStatus::probe(&self.catalog.communes, &self.files.communes),
            LayerStatus::probe(&self.catalog.atms, &self.files.atms),
        ];
        for status in statuses.iter().filter(|status| status.error.is_some()) {
            warn!(layer = status.layer, error = ?status.error, "layer unavailable");
        }
        statuses
    }
}
