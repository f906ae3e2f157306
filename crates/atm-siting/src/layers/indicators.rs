use super::LayerSource;
use crate::ingest::normalizer::{normalize_key, to_unit};
use crate::ingest::{read_table, ColumnKind, ColumnSpec, LayerSchema, LoadError, Record, SourceInfo};
use crate::spatial::{GeoPoint, Located};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// A numeric commune indicator, serialized under its canonical column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Indicator {
    #[serde(rename = "densite_norm")]
    DensityNorm,
    #[serde(rename = "densite")]
    Density,
    #[serde(rename = "indice_poi")]
    PoiIndex,
    #[serde(rename = "indice_acces")]
    Accessibility,
    #[serde(rename = "indice_trans")]
    Transport,
    #[serde(rename = "indice_densite")]
    RoadDensity,
    #[serde(rename = "iedu")]
    Education,
    #[serde(rename = "iniv")]
    IncomeLevel,
    #[serde(rename = "taux_jeunesse")]
    YouthRate,
    #[serde(rename = "taux_vieillesse")]
    AgingRate,
    #[serde(rename = "nb_atm")]
    CompetitorAtms,
    #[serde(rename = "indice_fecondite")]
    Fertility,
}

impl Indicator {
    pub const ALL: [Indicator; 12] = [
        Indicator::DensityNorm,
        Indicator::Density,
        Indicator::PoiIndex,
        Indicator::Accessibility,
        Indicator::Transport,
        Indicator::RoadDensity,
        Indicator::Education,
        Indicator::IncomeLevel,
        Indicator::YouthRate,
        Indicator::AgingRate,
        Indicator::CompetitorAtms,
        Indicator::Fertility,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Indicator::DensityNorm => "densite_norm",
            Indicator::Density => "densite",
            Indicator::PoiIndex => "indice_poi",
            Indicator::Accessibility => "indice_acces",
            Indicator::Transport => "indice_trans",
            Indicator::RoadDensity => "indice_densite",
            Indicator::Education => "iedu",
            Indicator::IncomeLevel => "iniv",
            Indicator::YouthRate => "taux_jeunesse",
            Indicator::AgingRate => "taux_vieillesse",
            Indicator::CompetitorAtms => "nb_atm",
            Indicator::Fertility => "indice_fecondite",
        }
    }

    /// Absolute-scale columns kept raw for display; never rescaled.
    pub fn is_absolute(&self) -> bool {
        matches!(self, Indicator::Density | Indicator::CompetitorAtms)
    }
}

static INDICATOR_SCHEMA: LayerSchema = LayerSchema {
    layer: IndicatorTable::LAYER,
    columns: &[
        ColumnSpec::required("commune_norm", ColumnKind::Text),
        ColumnSpec::optional("commune", ColumnKind::Text).or(&[
            "commune_x",
            "commune_y",
            "commune_nom",
        ]),
        ColumnSpec::optional("commune_code", ColumnKind::Text).or(&[
            "commune_pcode",
            "code",
            "code_commune",
        ]),
        ColumnSpec::required("latitude", ColumnKind::Number),
        ColumnSpec::required("longitude", ColumnKind::Number),
        ColumnSpec::required("densite_norm", ColumnKind::Number),
        ColumnSpec::optional("densite", ColumnKind::Number),
        ColumnSpec::optional("nb_atm", ColumnKind::Number),
        ColumnSpec::optional("indice_poi", ColumnKind::Number)
            .or(&["indice_poi_norm", "indice_poi_r"]),
        ColumnSpec::optional("indice_acces", ColumnKind::Number)
            .or(&["indice_accessibilite_x", "indice_accessibilite"]),
        ColumnSpec::optional("indice_trans", ColumnKind::Number).or(&[
            "indice_transport",
            "indice_transport_norm_x",
            "indice_trans_norm",
        ]),
        ColumnSpec::optional("indice_densite", ColumnKind::Number).or(&[
            "indice_densi",
            "indice_densite_routiere",
            "indice_densite_routiere_norm",
        ]),
        ColumnSpec::optional("iedu", ColumnKind::Number),
        ColumnSpec::optional("iniv", ColumnKind::Number),
        ColumnSpec::optional("taux_jeunesse", ColumnKind::Number).or(&["taux_jeuness"]),
        ColumnSpec::optional("taux_vieillesse", ColumnKind::Number).or(&["taux_vieilless"]),
        ColumnSpec::optional("indice_fecondite", ColumnKind::Number),
    ],
    latitude: "latitude",
    longitude: "longitude",
};

/// Indicator values rescaled to [0,1]. Only indicators present on the
/// source row appear; absolute-scale columns are excluded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedRow {
    values: BTreeMap<Indicator, f64>,
}

impl NormalizedRow {
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        self.values.get(&indicator).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Indicator, f64)> + '_ {
        self.values.iter().map(|(indicator, value)| (*indicator, *value))
    }
}

/// One commune's indicator vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub commune_name: Option<String>,
    pub commune_norm: String,
    pub commune_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    raw: BTreeMap<Indicator, f64>,
    #[serde(skip)]
    normalized: NormalizedRow,
    #[serde(skip)]
    source_row: usize,
}

impl IndicatorRow {
    /// Build a row; indicators are rescaled here, once.
    pub fn new(
        commune_name: Option<String>,
        commune_norm: &str,
        commune_code: Option<String>,
        position: GeoPoint,
        raw: BTreeMap<Indicator, f64>,
    ) -> Self {
        let commune_norm = match normalize_key(commune_norm) {
            key if key.is_empty() => commune_name.as_deref().map(normalize_key).unwrap_or_default(),
            key => key,
        };

        let normalized = NormalizedRow {
            values: raw
                .iter()
                .filter(|(indicator, _)| !indicator.is_absolute())
                .map(|(indicator, value)| (*indicator, to_unit(Some(*value))))
                .collect(),
        };

        Self {
            commune_name,
            commune_norm,
            commune_code,
            latitude: position.latitude,
            longitude: position.longitude,
            raw,
            normalized,
            source_row: 0,
        }
    }

    fn from_record(record: &Record) -> Option<Self> {
        let latitude = record.number("latitude")?;
        let longitude = record.number("longitude")?;
        let raw = Indicator::ALL
            .iter()
            .filter_map(|indicator| {
                record
                    .number(indicator.column())
                    .map(|value| (*indicator, value))
            })
            .collect();

        let mut row = Self::new(
            record.text("commune").map(str::to_string),
            record.text("commune_norm").unwrap_or_default(),
            record.text("commune_code").map(str::to_string),
            GeoPoint::new(latitude, longitude),
            raw,
        );
        row.source_row = record.row();
        Some(row)
    }

    /// Value as loaded, before rescaling.
    pub fn raw(&self, indicator: Indicator) -> Option<f64> {
        self.raw.get(&indicator).copied()
    }

    pub fn raw_values(&self) -> &BTreeMap<Indicator, f64> {
        &self.raw
    }

    pub fn normalized(&self) -> &NormalizedRow {
        &self.normalized
    }

    /// 0-based data row in the source file.
    pub fn source_row(&self) -> usize {
        self.source_row
    }

    /// `commune_norm` when known, else the display name.
    pub fn label(&self) -> &str {
        if !self.commune_norm.is_empty() {
            return &self.commune_norm;
        }
        self.commune_name.as_deref().unwrap_or_default()
    }
}

impl Located for IndicatorRow {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Population marker for map listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationPoint {
    pub id: String,
    pub commune: String,
    pub commune_norm: String,
    pub latitude: f64,
    pub longitude: f64,
    pub densite_norm: f64,
    pub densite: Option<f64>,
}

impl PopulationPoint {
    pub fn new(row: &IndicatorRow) -> Self {
        Self {
            id: format!("POP-{}", row.source_row + 1),
            commune: row.commune_name.clone().unwrap_or_default(),
            commune_norm: row.commune_norm.clone(),
            latitude: row.latitude,
            longitude: row.longitude,
            densite_norm: row.normalized.get(Indicator::DensityNorm).unwrap_or_default(),
            densite: row.raw(Indicator::Density),
        }
    }
}

/// The commune indicator layer.
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    rows: Vec<IndicatorRow>,
    columns: Vec<&'static str>,
    source: SourceInfo,
}

impl IndicatorTable {
    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the source file carried `indicator` under any accepted name.
    pub fn has_indicator(&self, indicator: Indicator) -> bool {
        self.columns.contains(&indicator.column())
    }
}

impl LayerSource for IndicatorTable {
    const LAYER: &'static str = "indicators";

    fn load(path: &Path) -> Result<Self, LoadError> {
        let table = read_table(path, &INDICATOR_SCHEMA)?;
        let rows: Vec<IndicatorRow> = table
            .records
            .iter()
            .filter_map(IndicatorRow::from_record)
            .collect();

        info!(
            layer = Self::LAYER,
            path = %path.display(),
            rows = rows.len(),
            encoding = %table.source.encoding,
            "indicator table loaded"
        );

        Ok(Self {
            rows,
            columns: table.columns,
            source: table.source,
        })
    }

    fn source(&self) -> &SourceInfo {
        &self.source
    }
}
