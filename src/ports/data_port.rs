//! Data loading port trait.

use crate::domain::dataset::TimeSeriesDataset;
use crate::domain::error::LoadError;
use std::path::Path;

pub trait DataPort {
    /// Loads `source` as the given file type (`csv` or `parquet`).
    fn load(&self, source: &Path, format: &str) -> Result<TimeSeriesDataset, LoadError>;
}
