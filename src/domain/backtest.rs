//! Moving-average strategy evaluation.
//!
//! Signal rule: Long when MA_5 is above Close, Short otherwise. A signal
//! observed on row i is traded from row i+1 so no row uses its own close.

use crate::domain::dataset::{CLOSE, TimeSeriesDataset};
use crate::domain::error::BacktestError;
use crate::domain::features::MA_COLUMN;
use crate::domain::metrics::BacktestMetrics;

pub const MIN_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Long,
    Short,
}

impl Position {
    pub fn sign(self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Short => -1.0,
        }
    }

    /// Long if `ma > close`, else Short.
    pub fn from_crossover(ma: f64, close: f64) -> Self {
        if ma > close {
            Position::Long
        } else {
            Position::Short
        }
    }
}

/// Per-row strategy series, all aligned to dataset rows. `None` marks an
/// undefined value.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyFrame {
    pub positions: Vec<Option<Position>>,
    pub lagged_positions: Vec<Option<Position>>,
    pub period_returns: Vec<Option<f64>>,
    pub strategy_returns: Vec<Option<f64>>,
}

impl StrategyFrame {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Strategy returns for the rows where one is defined, in row order.
    pub fn defined_returns(&self) -> Vec<f64> {
        self.strategy_returns.iter().flatten().copied().collect()
    }
}

/// Evaluates the moving-average rule over a processed dataset.
pub fn evaluate_signals(dataset: &TimeSeriesDataset) -> Result<StrategyFrame, BacktestError> {
    let close = require_column(dataset, CLOSE)?;
    let ma = require_column(dataset, MA_COLUMN)?;

    let rows = dataset.row_count();
    if rows < MIN_ROWS {
        return Err(BacktestError::InsufficientRows {
            rows,
            minimum: MIN_ROWS,
        });
    }

    let positions: Vec<Option<Position>> = ma
        .iter()
        .zip(close)
        .map(|(ma, close)| match (ma, close) {
            (Some(ma), Some(close)) => Some(Position::from_crossover(*ma, *close)),
            _ => None,
        })
        .collect();

    let lagged_positions: Vec<Option<Position>> = std::iter::once(None)
        .chain(positions[..rows - 1].iter().copied())
        .collect();

    let period_returns: Vec<Option<f64>> = std::iter::once(None)
        .chain(close.windows(2).map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) => Some((curr - prev) / prev),
            _ => None,
        }))
        .collect();

    let strategy_returns: Vec<Option<f64>> = lagged_positions
        .iter()
        .zip(&period_returns)
        .map(|(pos, ret)| match (pos, ret) {
            (Some(pos), Some(ret)) => Some(pos.sign() * ret),
            _ => None,
        })
        .collect();

    Ok(StrategyFrame {
        positions,
        lagged_positions,
        period_returns,
        strategy_returns,
    })
}

/// Runs the strategy over the processed dataset and computes its metrics.
pub fn run_backtest(dataset: &TimeSeriesDataset) -> Result<BacktestMetrics, BacktestError> {
    let frame = evaluate_signals(dataset)?;
    Ok(BacktestMetrics::compute(&frame, dataset.row_count()))
}

fn require_column<'a>(
    dataset: &'a TimeSeriesDataset,
    name: &str,
) -> Result<&'a [Option<f64>], BacktestError> {
    dataset
        .column(name)
        .ok_or_else(|| BacktestError::MissingColumn {
            column: name.to_string(),
        })
}
