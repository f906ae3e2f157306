use atm_siting::error::AppError;
use atm_siting::spatial::{BoundingBox, PageRequest};
use atm_siting::SitingError;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Run layer loading and scoring off the async workers.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, SitingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| AppError::Server(axum::Error::new(err)))?
        .map_err(AppError::from)
}

/// Viewport and paging parameters shared by the map listings.
#[derive(Debug, Deserialize)]
pub(crate) struct ViewportQuery {
    pub(crate) s: f64,
    pub(crate) n: f64,
    pub(crate) w: f64,
    pub(crate) e: f64,
    pub(crate) limit: Option<usize>,
    pub(crate) page: Option<usize>,
}

impl ViewportQuery {
    pub(crate) fn bounding_box(&self) -> Result<BoundingBox, AppError> {
        let finite = [self.s, self.n, self.w, self.e].iter().all(|value| value.is_finite());
        if !finite || self.s > self.n {
            return Err(AppError::BadRequest(format!(
                "invalid bounding box s={} n={} w={} e={}",
                self.s, self.n, self.w, self.e
            )));
        }
        Ok(BoundingBox {
            south: self.s,
            north: self.n,
            west: self.w,
            east: self.e,
        })
    }

    pub(crate) fn page_request(&self, default_limit: usize) -> Result<PageRequest, AppError> {
        let limit = self.limit.unwrap_or(default_limit);
        let page = self.page.unwrap_or(1);
        if !(1..=PageRequest::MAX_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                PageRequest::MAX_LIMIT
            )));
        }
        if page == 0 {
            return Err(AppError::BadRequest("page starts at 1".to_string()));
        }
        Ok(PageRequest::new(page, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(limit: Option<usize>, page: Option<usize>) -> ViewportQuery {
        ViewportQuery {
            s: 33.4,
            n: 33.7,
            w: -7.8,
            e: -7.4,
            limit,
            page,
        }
    }

    #[test]
    fn paging_defaults_and_bounds() {
        assert_eq!(
            viewport(None, None).page_request(20).expect("defaults"),
            PageRequest::new(1, 20)
        );
        assert!(viewport(Some(0), None).page_request(20).is_err());
        assert!(viewport(Some(5001), None).page_request(20).is_err());
        assert!(viewport(None, Some(0)).page_request(20).is_err());
    }

    #[test]
    fn inverted_latitudes_are_rejected() {
        let mut query = viewport(None, None);
        query.s = 34.0;
        assert!(query.bounding_box().is_err());
    }
}
