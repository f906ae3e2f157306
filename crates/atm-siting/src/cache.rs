//! In-memory memoization of parsed layers, keyed by source path.

use crate::ingest::LoadError;
use crate::layers::{AtmTable, CommuneAtlas, CompetitorTable, IndicatorTable, LayerSource, PoiTable};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// Parsed tables of one layer type. Concurrent misses on the same cold
/// path collapse into a single parse.
pub struct TableCache<T> {
    entries: RwLock<HashMap<PathBuf, Arc<T>>>,
    loads: AtomicUsize,
}

impl<T> Default for TableCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }
}

impl<T: LayerSource> TableCache<T> {
    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, Arc<T>>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!(layer = T::LAYER, "layer cache lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, Arc<T>>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!(layer = T::LAYER, "layer cache lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Cached table for `path`, parsing it on first access.
    pub fn load(&self, path: &Path) -> Result<Arc<T>, LoadError> {
        if let Some(table) = self.read().get(path) {
            return Ok(Arc::clone(table));
        }

        let mut entries = self.write();
        if let Some(table) = entries.get(path) {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(T::load(path)?);
        self.loads.fetch_add(1, Ordering::Relaxed);
        entries.insert(path.to_path_buf(), Arc::clone(&table));
        info!(layer = T::LAYER, path = %path.display(), "layer cached");

        Ok(table)
    }

    /// Already-parsed table for `path`, without touching disk.
    pub fn cached(&self, path: &Path) -> Option<Arc<T>> {
        self.read().get(path).cloned()
    }

    /// Drop every memoized table. Readers holding an `Arc` keep their copy.
    pub fn invalidate(&self) {
        let cleared = {
            let mut entries = self.write();
            let cleared = entries.len();
            entries.clear();
            cleared
        };
        info!(layer = T::LAYER, cleared, "layer cache invalidated");
    }

    /// Number of parses performed since creation.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

/// One cache per reference layer.
#[derive(Default)]
pub struct DataCatalog {
    pub indicators: TableCache<IndicatorTable>,
    pub competitors: TableCache<CompetitorTable>,
    pub poi: TableCache<PoiTable>,
    pub communes: TableCache<CommuneAtlas>,
    pub atms: TableCache<AtmTable>,
}

impl DataCatalog {
    pub fn invalidate_all(&self) {
        self.indicators.invalidate();
        self.competitors.invalidate();
        self.poi.invalidate();
        self.communes.invalidate();
        self.atms.invalidate();
    }
}
