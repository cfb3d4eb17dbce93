//! Missing-value imputation and derived feature columns.
//!
//! MA(n)[i] = sum(C[i-j] for j in 0..n) / n
//! Warmup: first (n-1) rows are undefined.

use crate::domain::dataset::{CLOSE, TimeSeriesDataset};
use crate::domain::error::FeatureError;
use tracing::debug;

pub const MA_WINDOW: usize = 5;
pub const MA_COLUMN: &str = "MA_5";

/// Columns produced by [`engineer_features`]. They are dropped and rebuilt on
/// every run so repeated runs never stack features.
pub const DERIVED_COLUMNS: &[&str] = &[MA_COLUMN];

/// Fills missing cells with column means and appends the moving average of `Close`.
pub fn engineer_features(
    mut dataset: TimeSeriesDataset,
) -> Result<TimeSeriesDataset, FeatureError> {
    if !dataset.has_column(CLOSE) {
        return Err(FeatureError::MissingColumn {
            column: CLOSE.to_string(),
        });
    }

    for name in DERIVED_COLUMNS {
        dataset.remove_column(name);
    }

    impute_column_means(&mut dataset);

    let close = dataset.column(CLOSE).unwrap_or_default();
    let ma = rolling_mean(close, MA_WINDOW);
    dataset.set_column(MA_COLUMN, ma);

    Ok(dataset)
}

/// Replaces every missing cell with the mean of the column's defined cells.
/// A column with no defined cells is left untouched.
pub fn impute_column_means(dataset: &mut TimeSeriesDataset) {
    let names: Vec<String> = dataset.column_names().map(str::to_string).collect();
    for name in names {
        let Some(values) = dataset.column_mut(&name) else {
            continue;
        };
        let Some(mean) = column_mean(values) else {
            debug!(column = %name, "column has no defined values; leaving missing");
            continue;
        };
        let mut filled = 0usize;
        for cell in values.iter_mut().filter(|cell| cell.is_none()) {
            *cell = Some(mean);
            filled += 1;
        }
        if filled > 0 {
            debug!(column = %name, filled, mean, "imputed missing values");
        }
    }
}

/// Arithmetic mean over the defined cells, `None` if there are none.
pub fn column_mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0_f64, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Trailing mean over `window` cells. Undefined during warmup and wherever
/// the window contains a missing cell.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let warmup = window - 1;

    (0..values.len())
        .map(|i| {
            if i < warmup {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let sum = slice
                .iter()
                .try_fold(0.0_f64, |acc, v| v.map(|v| acc + v))?;
            Some(sum / window as f64)
        })
        .collect()
}
