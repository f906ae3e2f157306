use super::LayerSource;
use crate::ingest::normalizer::normalize_key;
use crate::ingest::{read_source, EncodingAttempt, LoadError, SourceInfo, TextEncoding};
use crate::spatial::GeoPoint;
use chrono::Utc;
use geojson::{Feature, GeoJson, Geometry, Value};
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::info;

/// One administrative boundary with its lookup keys.
#[derive(Debug, Clone)]
pub struct CommuneBoundary {
    pub commune_norm: String,
    pub code: Option<String>,
    pub centroid: Option<GeoPoint>,
    pub feature: Feature,
}

/// The communes boundary layer.
#[derive(Debug, Clone)]
pub struct CommuneAtlas {
    communes: Vec<CommuneBoundary>,
    source: SourceInfo,
}

impl CommuneAtlas {
    pub fn communes(&self) -> &[CommuneBoundary] {
        &self.communes
    }

    /// Match a commune name or code, trimmed and case-insensitive.
    pub fn find(&self, commune_or_code: &str) -> Option<&CommuneBoundary> {
        let key = normalize_key(commune_or_code);
        if key.is_empty() {
            return None;
        }
        self.communes.iter().find(|commune| {
            commune.commune_norm == key
                || commune
                    .code
                    .as_deref()
                    .is_some_and(|code| normalize_key(code) == key)
        })
    }
}

fn property_text(feature: &Feature, name: &str) -> Option<String> {
    match feature.property(name)? {
        JsonValue::String(value) => Some(value.clone()),
        JsonValue::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

/// Mean of all polygon vertices. Good enough to center a map.
fn naive_centroid(geometry: &Geometry) -> Option<GeoPoint> {
    let rings: Vec<&Vec<Vec<f64>>> = match &geometry.value {
        Value::Polygon(rings) => rings.iter().collect(),
        Value::MultiPolygon(polygons) => polygons.iter().flatten().collect(),
        _ => return None,
    };

    let (mut lat_sum, mut lng_sum, mut count) = (0.0, 0.0, 0usize);
    for position in rings.into_iter().flatten() {
        if let [lng, lat, ..] = position.as_slice() {
            lng_sum += lng;
            lat_sum += lat;
            count += 1;
        }
    }

    (count > 0).then(|| GeoPoint::new(lat_sum / count as f64, lng_sum / count as f64))
}

fn boundary(mut feature: Feature) -> CommuneBoundary {
    let commune_norm = property_text(&feature, "commune_norm")
        .or_else(|| property_text(&feature, "commune"))
        .map(|name| normalize_key(&name))
        .unwrap_or_default();
    let code = property_text(&feature, "code");
    let centroid = feature.geometry.as_ref().and_then(naive_centroid);

    feature.set_property("commune_norm", commune_norm.clone());
    feature.set_property("centroid_lat", centroid.map(|point| point.latitude));
    feature.set_property("centroid_lng", centroid.map(|point| point.longitude));

    CommuneBoundary {
        commune_norm,
        code,
        centroid,
        feature,
    }
}

impl LayerSource for CommuneAtlas {
    const LAYER: &'static str = "communes";

    fn load(path: &Path) -> Result<Self, LoadError> {
        let bytes = read_source(path)?;
        let encoding = TextEncoding::Utf8Sig;
        let text = encoding.decode(&bytes).map_err(|reason| LoadError::Encoding {
            path: path.to_path_buf(),
            attempts: vec![EncodingAttempt { encoding, reason }],
        })?;

        let geojson: GeoJson = text.parse().map_err(|err: geojson::Error| LoadError::Geojson {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(LoadError::Geojson {
                path: path.to_path_buf(),
                reason: "expected a FeatureCollection".to_string(),
            });
        };

        let communes: Vec<CommuneBoundary> =
            collection.features.into_iter().map(boundary).collect();
        let without_centroid = communes.iter().filter(|c| c.centroid.is_none()).count();

        info!(
            layer = Self::LAYER,
            path = %path.display(),
            rows = communes.len(),
            without_centroid,
            "commune boundaries loaded"
        );

        Ok(Self {
            source: SourceInfo {
                layer: Self::LAYER,
                path: path.to_path_buf(),
                encoding,
                delimiter: None,
                rows: communes.len(),
                dropped: 0,
                loaded_at: Utc::now(),
            },
            communes,
        })
    }

    fn source(&self) -> &SourceInfo {
        &self.source
    }
}
