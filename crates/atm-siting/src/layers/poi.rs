use super::LayerSource;
use crate::ingest::{read_table, ColumnKind, ColumnSpec, LayerSchema, LoadError, Record, SourceInfo};
use crate::spatial::{GeoPoint, Located};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

static POI_SCHEMA: LayerSchema = LayerSchema {
    layer: PoiTable::LAYER,
    columns: &[
        ColumnSpec::required("latitude", ColumnKind::Number).or(&["lat"]),
        ColumnSpec::required("longitude", ColumnKind::Number).or(&["lon", "lng"]),
        ColumnSpec::optional("key", ColumnKind::Text),
        ColumnSpec::optional("value", ColumnKind::Text),
        ColumnSpec::optional("type", ColumnKind::Text).or(&[
            "amenity", "shop", "tourism", "leisure", "highway",
        ]),
        ColumnSpec::optional("name", ColumnKind::Text),
        ColumnSpec::optional("brand", ColumnKind::Text),
        ColumnSpec::optional("operator", ColumnKind::Text),
        ColumnSpec::optional("address", ColumnKind::Text).or(&["addr_full", "addr:full"]),
        ColumnSpec::optional("commune", ColumnKind::Text).or(&["commune_x", "commune_nom"]),
        ColumnSpec::optional("province", ColumnKind::Text),
        ColumnSpec::optional("region", ColumnKind::Text),
        ColumnSpec::optional("code", ColumnKind::Text).or(&["commune_pcode", "code_commune"]),
        ColumnSpec::optional("tags_json", ColumnKind::Text).or(&["tags"]),
    ],
    latitude: "latitude",
    longitude: "longitude",
};

/// An OpenStreetMap point of interest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointOfInterest {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub key: Option<String>,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub operator: Option<String>,
    pub address: Option<String>,
    pub commune: Option<String>,
    pub province: Option<String>,
    pub region: Option<String>,
    pub code: Option<String>,
    pub tags: Option<serde_json::Value>,
}

impl PointOfInterest {
    fn from_record(id: String, position: GeoPoint, record: &Record) -> Self {
        let text = |column: &str| record.text(column).map(str::to_string);
        let value = text("value");

        Self {
            id,
            latitude: position.latitude,
            longitude: position.longitude,
            key: text("key"),
            kind: text("type").or_else(|| value.clone()),
            value,
            name: text("name"),
            brand: text("brand"),
            operator: text("operator"),
            address: text("address"),
            commune: text("commune"),
            province: text("province"),
            region: text("region"),
            code: text("code"),
            tags: record.text("tags_json").and_then(parse_tags),
        }
    }
}

fn parse_tags(raw: &str) -> Option<serde_json::Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(error = %err, "ignoring unparseable poi tags");
            None
        }
    }
}

impl Located for PointOfInterest {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone)]
pub struct PoiTable {
    pois: Vec<PointOfInterest>,
    source: SourceInfo,
}

impl PoiTable {
    pub fn pois(&self) -> &[PointOfInterest] {
        &self.pois
    }
}

impl LayerSource for PoiTable {
    const LAYER: &'static str = "poi";

    fn load(path: &Path) -> Result<Self, LoadError> {
        let table = read_table(path, &POI_SCHEMA)?;

        let mut pois = Vec::with_capacity(table.records.len());
        for record in &table.records {
            let (Some(lat), Some(lng)) = (record.number("latitude"), record.number("longitude"))
            else {
                continue;
            };
            let id = format!("POI-{}", record.row() + 1);
            pois.push(PointOfInterest::from_record(id, GeoPoint::new(lat, lng), record));
        }

        info!(layer = Self::LAYER, path = %path.display(), rows = pois.len(), "poi table loaded");

        Ok(Self {
            pois,
            source: table.source,
        })
    }

    fn source(&self) -> &SourceInfo {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn type_falls_back_to_value_and_tags_parse() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(
            "lat\tlon\tkey\tvalue\tname\ttags_json\n\
             33.59\t-7.61\tamenity\tbank\tBanque Populaire\t{\"atm\":\"yes\"}\n\
             33.60\t-7.62\tshop\tmall\tMorocco Mall\tnot json\n"
                .as_bytes(),
        )
        .expect("write fixture");

        let table = PoiTable::load(file.path()).expect("table loads");
        let pois = table.pois();

        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].id, "POI-1");
        assert_eq!(pois[0].kind.as_deref(), Some("bank"));
        assert_eq!(pois[0].tags, Some(serde_json::json!({ "atm": "yes" })));
        assert_eq!(pois[1].kind.as_deref(), Some("mall"));
        assert_eq!(pois[1].tags, None);
        assert_eq!(table.source().delimiter, Some('\t'));
    }

    #[test]
    fn explicit_type_column_wins() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"latitude,longitude,value,amenity\n33.5,-7.6,yes,atm\n")
            .expect("write fixture");

        let table = PoiTable::load(file.path()).expect("table loads");
        assert_eq!(table.pois()[0].kind.as_deref(), Some("atm"));
        assert_eq!(table.pois()[0].value.as_deref(), Some("yes"));
    }
}
