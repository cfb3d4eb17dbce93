//! External analysis engine port trait.
//!
//! Implementations own the whole engine round trip: acquiring the engine,
//! converting the dataset, invoking the script and normalizing the output.
//! The trait is object-safe so the pipeline can hold `&dyn AnalysisPort`.

use crate::domain::analysis::AnalysisResult;
use crate::domain::dataset::TimeSeriesDataset;
use crate::domain::error::ExternalEngineError;
use async_trait::async_trait;

#[async_trait]
pub trait AnalysisPort: Send + Sync {
    /// Short engine label used in logs and errors.
    fn engine(&self) -> &str;

    async fn run(
        &self,
        dataset: &TimeSeriesDataset,
    ) -> Result<AnalysisResult, ExternalEngineError>;
}
