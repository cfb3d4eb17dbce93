//! Performance metrics for the strategy return series.
//!
//! Conventions kept for compatibility with existing reports:
//! - annualized return compounds total return over `252 / rows` years
//! - volatility is the sample standard deviation scaled by sqrt(252)
//! - Sharpe is 0 when volatility is 0

use crate::domain::backtest::StrategyFrame;
use serde::Serialize;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestMetrics {
    pub cumulative_returns: Vec<Option<f64>>,
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
}

impl BacktestMetrics {
    /// `row_count` is the dataset length, which sets the annualization exponent.
    pub fn compute(frame: &StrategyFrame, row_count: usize) -> Self {
        let cumulative_returns = cumulative_returns(&frame.strategy_returns);

        let total_return = cumulative_returns
            .iter()
            .rev()
            .find_map(|v| *v)
            .unwrap_or(0.0);

        let annualized_return = if row_count > 0 {
            (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / row_count as f64) - 1.0
        } else {
            0.0
        };

        let annualized_volatility =
            sample_stddev(&frame.defined_returns()) * TRADING_DAYS_PER_YEAR.sqrt();

        let sharpe_ratio = if annualized_volatility > 0.0 {
            annualized_return / annualized_volatility
        } else {
            0.0
        };

        BacktestMetrics {
            cumulative_returns,
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
        }
    }
}

/// Running product of (1 + r) minus 1. Rows without a strategy return stay
/// undefined and do not break the compounding chain.
pub fn cumulative_returns(strategy_returns: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut growth = 1.0_f64;
    strategy_returns
        .iter()
        .map(|r| {
            r.map(|r| {
                growth *= 1.0 + r;
                growth - 1.0
            })
        })
        .collect()
}

/// Sample standard deviation (n - 1). Zero for fewer than two values.
pub fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
