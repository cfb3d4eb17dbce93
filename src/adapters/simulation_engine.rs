//! Simulation engine adapter (GNU Octave or MATLAB).
//!
//! The dataset is written to a temporary JSON file whose path is passed as
//! `{input}`. The driver decodes it into a struct named `data`, runs the
//! simulation script and prints `jsonencode(result)`. The engine's value is
//! opaque to the pipeline and is stored under [`RESULT_KEY`].

use crate::adapters::engine_session::{
    parse_engine_output, require_script, EngineCommand, EngineSession,
};
use crate::domain::analysis::{normalize_value, AnalysisResult};
use crate::domain::dataset::TimeSeriesDataset;
use crate::domain::error::ExternalEngineError;
use crate::ports::analysis_port::AnalysisPort;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const RESULT_KEY: &str = "result";

// Paths come from the environment so they never need quoting inside the
// evaluated expression.
const DRIVER: &str = "data = jsondecode(fileread(getenv('FUSETRADER_INPUT'))); \
run(getenv('FUSETRADER_SCRIPT')); \
disp(jsonencode(result));";

pub struct SimulationEngineAdapter {
    command: EngineCommand,
    script_path: PathBuf,
}

impl SimulationEngineAdapter {
    pub fn new(command: EngineCommand, script_path: impl Into<PathBuf>) -> Self {
        Self {
            command,
            script_path: script_path.into(),
        }
    }

    pub fn octave(program: &str, script_path: impl Into<PathBuf>) -> Self {
        let command = EngineCommand::new(program)
            .arg("--no-gui")
            .arg("--quiet")
            .arg("--eval")
            .arg(DRIVER);
        Self::new(command, script_path)
    }

    pub fn matlab(program: &str, script_path: impl Into<PathBuf>) -> Self {
        let command = EngineCommand::new(program).arg("-batch").arg(DRIVER);
        Self::new(command, script_path)
    }

    /// Picks the MATLAB driver when `program` names a `matlab` executable,
    /// Octave otherwise.
    pub fn for_program(program: &str, script_path: impl Into<PathBuf>) -> Self {
        let is_matlab = Path::new(program)
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.eq_ignore_ascii_case("matlab"));
        if is_matlab {
            Self::matlab(program, script_path)
        } else {
            Self::octave(program, script_path)
        }
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }
}

#[async_trait]
impl AnalysisPort for SimulationEngineAdapter {
    fn engine(&self) -> &str {
        "simulation"
    }

    async fn run(&self, dataset: &TimeSeriesDataset) -> Result<AnalysisResult, ExternalEngineError> {
        require_script(&self.script_path)?;

        let mut record = dataset.to_column_record();
        record.pad_to_max_len();
        let json = record.to_json().map_err(conversion_failure)?;

        let mut input_file = tempfile::Builder::new()
            .prefix("fusetrader-sim-")
            .suffix(".json")
            .tempfile()
            .map_err(conversion_failure)?;
        input_file.write_all(&json).map_err(conversion_failure)?;
        input_file.flush().map_err(conversion_failure)?;

        let script = self.script_path.display().to_string();
        let input = input_file.path().display().to_string();
        info!(engine = self.engine(), script = %script, "invoking engine");

        let mut session = EngineSession::spawn(
            self.engine(),
            &self.command,
            &[("script", script.as_str()), ("input", input.as_str())],
            false,
        )?;
        let stdout = session.communicate(&[]).await?;

        let value = parse_engine_output(&stdout)?;
        if value.is_null() {
            return Ok(AnalysisResult::empty());
        }
        Ok(AnalysisResult::single(RESULT_KEY, normalize_value(&value)))
    }
}

fn conversion_failure(err: impl std::fmt::Display) -> ExternalEngineError {
    ExternalEngineError::ConversionFailure {
        reason: err.to_string(),
    }
}
