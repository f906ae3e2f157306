use super::normalizer::{clean_text, parse_number};
use super::schema::{ColumnBinding, ColumnKind, LayerSchema};
use super::{Cell, Record};

/// Header row plus raw records of one decoded file.
#[derive(Debug)]
pub(crate) struct RawTable {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<csv::StringRecord>,
}

pub(crate) fn parse_text(text: &str, delimiter: u8) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|header| header.to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?);
    }

    Ok(RawTable { headers, rows })
}

fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat)
}

fn is_valid_longitude(lon: f64) -> bool {
    (-180.0..=180.0).contains(&lon)
}

/// Coerce raw rows into canonical records, dropping rows without usable
/// coordinates. Returns the kept records and the number dropped.
pub(crate) fn coerce_records(
    schema: &LayerSchema,
    bindings: &[ColumnBinding],
    rows: &[csv::StringRecord],
) -> (Vec<Record>, usize) {
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0;

    for (position, row) in rows.iter().enumerate() {
        let mut record = Record::at_row(position);

        for binding in bindings {
            let Some(raw) = binding.index.and_then(|index| row.get(index)) else {
                continue;
            };
            let cell = match binding.spec.kind {
                ColumnKind::Text => clean_text(raw).map(Cell::Text),
                ColumnKind::Number => parse_number(raw).map(Cell::Number),
            };
            if let Some(cell) = cell {
                record.insert(binding.spec.canonical, cell);
            }
        }

        let located = matches!(record.number(schema.latitude), Some(lat) if is_valid_latitude(lat))
            && matches!(record.number(schema.longitude), Some(lon) if is_valid_longitude(lon));
        if !located {
            dropped += 1;
            continue;
        }

        records.push(record);
    }

    (records, dropped)
}
