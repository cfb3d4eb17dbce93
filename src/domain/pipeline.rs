//! Pipeline controller.
//!
//! Load, engineer features, then run the two external engines and the
//! backtest concurrently over the same processed dataset. Engine failures
//! degrade to empty results; everything else aborts the run, cancelling any
//! engine still running.

use crate::domain::analysis::AnalysisResult;
use crate::domain::backtest::run_backtest;
use crate::domain::dataset::TimeSeriesDataset;
use crate::domain::error::{ExternalEngineError, FusetraderError};
use crate::domain::features::engineer_features;
use crate::domain::report::{combine, CombinedReport};
use crate::ports::analysis_port::AnalysisPort;
use crate::ports::data_port::DataPort;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Runs one engine under a deadline. Any error, including the deadline
/// expiring, is logged and replaced by the empty result.
pub async fn invoke_fail_soft(
    port: &dyn AnalysisPort,
    dataset: &TimeSeriesDataset,
    timeout: Duration,
) -> AnalysisResult {
    let outcome = match tokio::time::timeout(timeout, port.run(dataset)).await {
        Ok(result) => result,
        Err(_) => Err(ExternalEngineError::Timeout {
            engine: port.engine().to_string(),
            after: timeout,
        }),
    };

    match outcome {
        Ok(result) => {
            info!(engine = port.engine(), entries = result.len(), "engine finished");
            result
        }
        Err(e) => {
            warn!(engine = port.engine(), error = %e, "engine failed, using empty result");
            AnalysisResult::empty()
        }
    }
}

pub struct PipelineRun {
    pub report: CombinedReport,
    pub elapsed: Duration,
}

pub struct Pipeline<'a> {
    pub data_port: &'a dyn DataPort,
    pub statistical: &'a dyn AnalysisPort,
    pub simulation: &'a dyn AnalysisPort,
    pub engine_timeout: Duration,
}

impl Pipeline<'_> {
    pub async fn run(&self, source: &Path, format: &str) -> Result<PipelineRun, FusetraderError> {
        let started = Instant::now();

        info!(path = %source.display(), format, "loading dataset");
        let raw = self.data_port.load(source, format)?;
        let dataset = engineer_features(raw)?;
        info!(
            rows = dataset.row_count(),
            columns = dataset.column_names().count(),
            "features engineered"
        );

        // A backtest error returns at once; the engine futures are dropped
        // and their sessions killed.
        let (statistical, simulation, metrics) = tokio::try_join!(
            async {
                Ok::<_, FusetraderError>(
                    invoke_fail_soft(self.statistical, &dataset, self.engine_timeout).await,
                )
            },
            async {
                Ok::<_, FusetraderError>(
                    invoke_fail_soft(self.simulation, &dataset, self.engine_timeout).await,
                )
            },
            async { run_backtest(&dataset).map_err(FusetraderError::from) },
        )?;

        let report = combine(statistical, simulation, metrics);
        let elapsed = started.elapsed();
        info!(elapsed_ms = elapsed.as_millis() as u64, "pipeline finished");

        Ok(PipelineRun { report, elapsed })
    }
}
