//! Combined report of the external analyses and the backtest.

use crate::domain::analysis::AnalysisResult;
use crate::domain::metrics::BacktestMetrics;
use serde::Serialize;

/// Final output of a pipeline run. All three sections are always present;
/// an external section is an empty mapping when its engine failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedReport {
    statistical_results: AnalysisResult,
    simulation_results: AnalysisResult,
    backtest_results: BacktestMetrics,
}

impl CombinedReport {
    pub fn statistical_results(&self) -> &AnalysisResult {
        &self.statistical_results
    }

    pub fn simulation_results(&self) -> &AnalysisResult {
        &self.simulation_results
    }

    pub fn backtest_results(&self) -> &BacktestMetrics {
        &self.backtest_results
    }
}

pub fn combine(
    statistical: AnalysisResult,
    simulation: AnalysisResult,
    metrics: BacktestMetrics,
) -> CombinedReport {
    CombinedReport {
        statistical_results: statistical,
        simulation_results: simulation,
        backtest_results: metrics,
    }
}
