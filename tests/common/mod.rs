#![allow(dead_code)]

use async_trait::async_trait;
use fusetrader::domain::analysis::AnalysisResult;
use fusetrader::domain::dataset::TimeSeriesDataset;
use fusetrader::domain::error::{ExternalEngineError, LoadError};
use fusetrader::ports::analysis_port::AnalysisPort;
use fusetrader::ports::data_port::DataPort;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Closing prices whose processed form gives MA_5 = [103.0, 104.2, 105.8]
/// on the last three rows.
pub const SCENARIO_CLOSES: [f64; 7] = [100.0, 102.0, 101.0, 105.0, 107.0, 106.0, 110.0];

pub const SCENARIO_CSV: &str = "Date,Open,Close\n\
2024-01-01,99.5,100.0\n\
2024-01-02,100.0,102.0\n\
2024-01-03,102.0,101.0\n\
2024-01-04,101.0,105.0\n\
2024-01-05,105.0,107.0\n\
2024-01-08,107.0,106.0\n\
2024-01-09,106.0,110.0\n";

/// Expected compounded return of the scenario: +1/107 then -4/106.
pub fn scenario_total_return() -> f64 {
    (1.0 + 1.0 / 107.0) * (1.0 - 4.0 / 106.0) - 1.0
}

pub fn close_dataset(closes: &[f64]) -> TimeSeriesDataset {
    TimeSeriesDataset::from_columns(vec![(
        "Close".to_string(),
        closes.iter().copied().map(Some).collect(),
    )])
    .unwrap()
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub struct MockDataPort {
    dataset: Option<TimeSeriesDataset>,
    parse_failure: Option<String>,
    loads: AtomicUsize,
}

impl MockDataPort {
    /// A port with no data: every load is `NotFound`.
    pub fn new() -> Self {
        Self {
            dataset: None,
            parse_failure: None,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn with_dataset(mut self, dataset: TimeSeriesDataset) -> Self {
        self.dataset = Some(dataset);
        self
    }

    pub fn with_parse_failure(mut self, reason: &str) -> Self {
        self.parse_failure = Some(reason.to_string());
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl DataPort for MockDataPort {
    fn load(&self, source: &Path, _format: &str) -> Result<TimeSeriesDataset, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.parse_failure {
            return Err(LoadError::ParseFailure {
                path: source.display().to_string(),
                reason: reason.clone(),
            });
        }
        self.dataset.clone().ok_or_else(|| LoadError::NotFound {
            path: source.display().to_string(),
        })
    }
}

pub enum Behaviour {
    Succeed(AnalysisResult),
    Fail(ExternalEngineError),
    Hang,
}

pub struct MockAnalysisPort {
    name: String,
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl MockAnalysisPort {
    pub fn succeeding(name: &str, result: AnalysisResult) -> Self {
        Self::with_behaviour(name, Behaviour::Succeed(result))
    }

    pub fn failing(name: &str, err: ExternalEngineError) -> Self {
        Self::with_behaviour(name, Behaviour::Fail(err))
    }

    pub fn hanging(name: &str) -> Self {
        Self::with_behaviour(name, Behaviour::Hang)
    }

    fn with_behaviour(name: &str, behaviour: Behaviour) -> Self {
        Self {
            name: name.to_string(),
            behaviour,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisPort for MockAnalysisPort {
    fn engine(&self) -> &str {
        &self.name
    }

    async fn run(&self, _dataset: &TimeSeriesDataset) -> Result<AnalysisResult, ExternalEngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Succeed(result) => Ok(result.clone()),
            Behaviour::Fail(err) => Err(err.clone()),
            Behaviour::Hang => std::future::pending().await,
        }
    }
}
