use super::LayerSource;
use crate::ingest::{read_table, ColumnKind, ColumnSpec, LayerSchema, LoadError, Record, SourceInfo};
use crate::spatial::{GeoPoint, Located};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

static ATM_SCHEMA: LayerSchema = LayerSchema {
    layer: AtmTable::LAYER,
    columns: &[
        ColumnSpec::required("name", ColumnKind::Text),
        ColumnSpec::required("operator", ColumnKind::Text),
        ColumnSpec::required("amenity", ColumnKind::Text),
        ColumnSpec::required("latitude", ColumnKind::Number).or(&["lat"]),
        ColumnSpec::required("longitude", ColumnKind::Number).or(&["lon", "lng"]),
        ColumnSpec::optional("city", ColumnKind::Text).or(&["city_name", "addr_city"]),
    ],
    latitude: "latitude",
    longitude: "longitude",
};

const UNKNOWN_CITY: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallationType {
    Atm,
    Agency,
}

impl InstallationType {
    fn from_amenity(amenity: Option<&str>) -> Self {
        match amenity {
            Some(value) if value.eq_ignore_ascii_case("atm") => Self::Atm,
            _ => Self::Agency,
        }
    }
}

/// An installed ATM or bank agency from the national inventory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtmSite {
    pub id: String,
    pub bank_name: String,
    pub installation_type: InstallationType,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl AtmSite {
    /// `None` when the row names neither a bank nor an operator.
    fn from_record(record: &Record, latitude: f64, longitude: f64) -> Option<Self> {
        let bank_name = record.text("name").or_else(|| record.text("operator"))?;

        Some(Self {
            id: format!("ATM-{}", record.row() + 1),
            bank_name: bank_name.to_string(),
            installation_type: InstallationType::from_amenity(record.text("amenity")),
            city: record.text("city").unwrap_or(UNKNOWN_CITY).to_string(),
            latitude,
            longitude,
        })
    }
}

impl Located for AtmSite {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Existing ATM network.
#[derive(Debug, Clone)]
pub struct AtmTable {
    sites: Vec<AtmSite>,
    source: SourceInfo,
}

impl AtmTable {
    pub fn sites(&self) -> &[AtmSite] {
        &self.sites
    }
}

impl LayerSource for AtmTable {
    const LAYER: &'static str = "atms";

    fn load(path: &Path) -> Result<Self, LoadError> {
        let table = read_table(path, &ATM_SCHEMA)?;

        let mut sites = Vec::with_capacity(table.records.len());
        let mut unnamed = 0;
        for record in &table.records {
            let (Some(latitude), Some(longitude)) =
                (record.number("latitude"), record.number("longitude"))
            else {
                continue;
            };
            match AtmSite::from_record(record, latitude, longitude) {
                Some(site) => sites.push(site),
                None => unnamed += 1,
            }
        }

        if unnamed > 0 {
            warn!(
                layer = Self::LAYER,
                path = %path.display(),
                dropped = unnamed,
                "dropped rows without name or operator"
            );
        }
        info!(layer = Self::LAYER, path = %path.display(), rows = sites.len(), "atm table loaded");

        let mut source = table.source;
        source.rows = sites.len();
        source.dropped += unnamed;

        Ok(Self { sites, source })
    }

    fn source(&self) -> &SourceInfo {
        &self.source
    }
}
