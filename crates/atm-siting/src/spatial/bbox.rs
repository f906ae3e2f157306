use super::GeoPoint;
use serde::{Deserialize, Serialize};

/// Map viewport in degrees. `west > east` means the box crosses the
/// antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        let lat_ok = (self.south..=self.north).contains(&point.latitude);
        let lon_ok = if self.west <= self.east {
            (self.west..=self.east).contains(&point.longitude)
        } else {
            point.longitude >= self.west || point.longitude <= self.east
        };
        lat_ok && lon_ok
    }
}

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    pub const MAX_LIMIT: usize = 5000;

    /// Clamp `page` to at least 1 and `limit` to `1..=MAX_LIMIT`.
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of matches plus the total match count before paging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
}

impl<T> Page<T> {
    pub(crate) fn collect<I>(matches: I, request: PageRequest) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut total_count = 0;
        let mut items = Vec::new();
        let offset = request.offset();

        for (position, item) in matches.into_iter().enumerate() {
            total_count += 1;
            if position >= offset && items.len() < request.limit {
                items.push(item);
            }
        }

        Page { items, total_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_handles_regular_and_wrapped_boxes() {
        let morocco = BoundingBox {
            south: 27.0,
            north: 36.0,
            west: -13.0,
            east: -1.0,
        };
        assert!(morocco.contains(&GeoPoint::new(33.6, -7.6)));
        assert!(!morocco.contains(&GeoPoint::new(33.6, 2.0)));

        let pacific = BoundingBox {
            south: -20.0,
            north: 20.0,
            west: 170.0,
            east: -170.0,
        };
        assert!(pacific.contains(&GeoPoint::new(0.0, 175.0)));
        assert!(pacific.contains(&GeoPoint::new(0.0, -175.0)));
        assert!(!pacific.contains(&GeoPoint::new(0.0, 0.0)));
    }

    #[test]
    fn page_counts_all_matches() {
        let page = Page::collect(1..=7, PageRequest::new(2, 3));
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total_count, 7);

        let past_end = Page::collect(1..=7, PageRequest::new(4, 3));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_count, 7);
    }

    #[test]
    fn page_request_clamps_inputs() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, limit: 1 });
        assert_eq!(
            PageRequest::new(3, 10_000),
            PageRequest {
                page: 3,
                limit: PageRequest::MAX_LIMIT
            }
        );
    }
}
