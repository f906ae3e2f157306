use super::LayerSource;
use crate::ingest::normalizer::normalize_key;
use crate::ingest::{read_table, ColumnKind, ColumnSpec, LayerSchema, LoadError, SourceInfo};
use crate::spatial::{GeoPoint, Located};
use serde::Serialize;
use std::path::Path;
use tracing::info;

static COMPETITOR_SCHEMA: LayerSchema = LayerSchema {
    layer: CompetitorTable::LAYER,
    columns: &[
        ColumnSpec::required("commune", ColumnKind::Text),
        ColumnSpec::required("societe", ColumnKind::Text),
        ColumnSpec::required("nb_atm", ColumnKind::Number),
        ColumnSpec::required("commune_norm", ColumnKind::Text),
        ColumnSpec::required("latitude", ColumnKind::Number).or(&["lat"]),
        ColumnSpec::required("longitude", ColumnKind::Number).or(&["lng", "lon"]),
    ],
    latitude: "latitude",
    longitude: "longitude",
};

/// A competing bank's ATM presence in one commune.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorSite {
    pub id: String,
    pub bank_name: String,
    pub commune: String,
    pub commune_norm: String,
    pub latitude: f64,
    pub longitude: f64,
    pub atm_count: u32,
}

impl Located for CompetitorSite {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone)]
pub struct CompetitorTable {
    sites: Vec<CompetitorSite>,
    source: SourceInfo,
}

impl CompetitorTable {
    pub fn sites(&self) -> &[CompetitorSite] {
        &self.sites
    }
}

fn atm_count(raw: Option<f64>) -> u32 {
    match raw {
        Some(value) if value >= 0.0 => value.round().min(u32::MAX as f64) as u32,
        Some(_) => 0,
        // a listed branch counts as one machine when the count is blank
        None => 1,
    }
}

impl LayerSource for CompetitorTable {
    const LAYER: &'static str = "competitors";

    fn load(path: &Path) -> Result<Self, LoadError> {
        let table = read_table(path, &COMPETITOR_SCHEMA)?;

        let mut sites = Vec::with_capacity(table.records.len());
        for record in &table.records {
            let (Some(latitude), Some(longitude)) =
                (record.number("latitude"), record.number("longitude"))
            else {
                continue;
            };
            let commune = record.text("commune").unwrap_or_default().to_string();
            let commune_norm = match record.text("commune_norm") {
                Some(key) => normalize_key(key),
                None => normalize_key(&commune),
            };

            sites.push(CompetitorSite {
                id: format!("CMP-{}", record.row() + 1),
                bank_name: record.text("societe").unwrap_or("Inconnue").to_string(),
                commune,
                commune_norm,
                latitude,
                longitude,
                atm_count: atm_count(record.number("nb_atm")),
            });
        }

        info!(
            layer = Self::LAYER,
            path = %path.display(),
            rows = sites.len(),
            "competitor table loaded"
        );

        Ok(Self {
            sites,
            source: table.source,
        })
    }

    fn source(&self) -> &SourceInfo {
        &self.source
    }
}
