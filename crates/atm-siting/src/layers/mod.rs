//! Typed reference layers built on top of the ingest pipeline.

pub mod atms;
pub mod communes;
pub mod competitors;
pub mod indicators;
pub mod poi;

pub use atms::{AtmSite, AtmTable, InstallationType};
pub use communes::{CommuneAtlas, CommuneBoundary};
pub use competitors::{CompetitorSite, CompetitorTable};
pub use indicators::{Indicator, IndicatorRow, IndicatorTable, NormalizedRow, PopulationPoint};
pub use poi::{PoiTable, PointOfInterest};

use crate::ingest::{LoadError, SourceInfo};
use std::path::Path;

/// A layer that can be parsed from one source file and cached as a whole.
pub trait LayerSource: Sized + Send + Sync + 'static {
    /// Short layer name used in logs and status output.
    const LAYER: &'static str;

    fn load(path: &Path) -> Result<Self, LoadError>;

    fn source(&self) -> &SourceInfo;
}
