//! Resolve a query point or a commune key to one indicator row.

use super::{GeoPoint, Located};
use crate::ingest::normalizer::normalize_key;
use crate::layers::IndicatorRow;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("no commune matches '{query}'")]
    NotFound { query: String },
}

/// The row closest to a query point and its great-circle distance.
#[derive(Debug)]
pub struct Nearest<'a, T> {
    pub item: &'a T,
    pub distance_km: f64,
}

impl<T> Clone for Nearest<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Nearest<'_, T> {}

/// Row with the smallest haversine distance to `point`.
///
/// Ties keep the first row in table order.
pub fn nearest<'a, T: Located>(
    rows: &'a [T],
    point: GeoPoint,
) -> Result<Nearest<'a, T>, ResolveError> {
    let mut best: Option<Nearest<'a, T>> = None;

    for item in rows {
        let distance_km = point.distance_km(&item.position());
        if best.as_ref().map_or(true, |current| distance_km < current.distance_km) {
            best = Some(Nearest { item, distance_km });
        }
    }

    best.ok_or_else(|| ResolveError::NotFound {
        query: format!("{:.6},{:.6}", point.latitude, point.longitude),
    })
}

/// Exact key match on `commune_norm`, then the display name, then the code.
pub fn by_key<'a>(rows: &'a [IndicatorRow], key: &str) -> Result<&'a IndicatorRow, ResolveError> {
    let wanted = normalize_key(key);
    let not_found = || ResolveError::NotFound {
        query: key.trim().to_string(),
    };
    if wanted.is_empty() {
        return Err(not_found());
    }

    let matches = |value: Option<&str>| value.is_some_and(|value| normalize_key(value) == wanted);

    rows.iter()
        .find(|row| row.commune_norm == wanted)
        .or_else(|| rows.iter().find(|row| matches(row.commune_name.as_deref())))
        .or_else(|| rows.iter().find(|row| matches(row.commune_code.as_deref())))
        .ok_or_else(not_found)
}
