//! Statistical engine adapter.
//!
//! The dataset is piped to the engine as a JSON column record. The default
//! command runs an R driver that sources the analysis script, calls the
//! entry point with a data frame and prints the returned list as JSON.

use crate::adapters::engine_session::{
    parse_engine_output, require_script, EngineCommand, EngineSession,
};
use crate::domain::analysis::{normalize_mapping, AnalysisResult};
use crate::domain::dataset::TimeSeriesDataset;
use crate::domain::error::ExternalEngineError;
use crate::ports::analysis_port::AnalysisPort;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

const R_DRIVER: &str = r#"args <- commandArgs(trailingOnly = TRUE)
source(args[1])
input <- jsonlite::fromJSON(paste(readLines(file("stdin"), warn = FALSE), collapse = "\n"))
data <- as.data.frame(input)
result <- do.call(args[2], list(data))
cat(jsonlite::toJSON(result, auto_unbox = TRUE, na = "null", digits = NA, force = TRUE))"#;

pub struct StatisticalEngineAdapter {
    command: EngineCommand,
    script_path: PathBuf,
    entry_point: String,
}

impl StatisticalEngineAdapter {
    /// Runs `command` with `{script}` and `{entry_point}` expanded. The
    /// dataset arrives on stdin; a JSON object is expected on stdout.
    pub fn new(
        command: EngineCommand,
        script_path: impl Into<PathBuf>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            command,
            script_path: script_path.into(),
            entry_point: entry_point.into(),
        }
    }

    pub fn rscript(
        program: &str,
        script_path: impl Into<PathBuf>,
        entry_point: impl Into<String>,
    ) -> Self {
        let command = EngineCommand::new(program)
            .arg("-e")
            .arg(R_DRIVER)
            .arg("{script}")
            .arg("{entry_point}");
        Self::new(command, script_path, entry_point)
    }

    pub fn script_path(&self) -> &std::path::Path {
        &self.script_path
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

#[async_trait]
impl AnalysisPort for StatisticalEngineAdapter {
    fn engine(&self) -> &str {
        "statistical"
    }

    async fn run(&self, dataset: &TimeSeriesDataset) -> Result<AnalysisResult, ExternalEngineError> {
        require_script(&self.script_path)?;

        let input = dataset
            .to_column_record()
            .to_json()
            .map_err(|e| ExternalEngineError::ConversionFailure {
                reason: e.to_string(),
            })?;

        let script = self.script_path.display().to_string();
        info!(engine = self.engine(), script = %script, entry_point = %self.entry_point, "invoking engine");

        let mut session = EngineSession::spawn(
            self.engine(),
            &self.command,
            &[("script", script.as_str()), ("entry_point", self.entry_point.as_str())],
            true,
        )?;
        let stdout = session.communicate(&input).await?;

        normalize_mapping(&parse_engine_output(&stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{AnalysisValue, Scalar};
    use crate::domain::config::DEFAULT_ENTRY_POINT;
    use std::fs;
    use tempfile::TempDir;

    fn dataset() -> TimeSeriesDataset {
        TimeSeriesDataset::from_columns(vec![(
            "Close".to_string(),
            vec![Some(100.0), Some(101.0), None],
        )])
        .unwrap()
    }

    fn sh_adapter(dir: &TempDir, body: &str) -> StatisticalEngineAdapter {
        let path = dir.path().join("analysis.sh");
        fs::write(&path, body).unwrap();
        let command = EngineCommand::new("sh").arg("{script}").arg("{entry_point}");
        StatisticalEngineAdapter::new(command, path, DEFAULT_ENTRY_POINT)
    }

    #[test]
    fn rscript_command_carries_placeholders() {
        let adapter = StatisticalEngineAdapter::rscript("Rscript", "analysis.R", "fit");
        let args = adapter.command.args();
        assert_eq!(args[0], "-e");
        assert_eq!(&args[2..], &["{script}", "{entry_point}"]);
        assert_eq!(adapter.entry_point(), "fit");
    }

    #[tokio::test]
    async fn missing_script_is_reported() {
        let dir = TempDir::new().unwrap();
        let adapter = StatisticalEngineAdapter::rscript("Rscript", dir.path().join("absent.R"), "x");
        let err = adapter.run(&dataset()).await.unwrap_err();
        assert!(matches!(err, ExternalEngineError::ScriptMissing { .. }));
    }

    #[tokio::test]
    async fn object_output_becomes_mapping() {
        let dir = TempDir::new().unwrap();
        let adapter = sh_adapter(
            &dir,
            "cat > /dev/null\necho \"{\\\"entry\\\": \\\"$1\\\", \\\"coef\\\": [0.5, 1.5]}\"\n",
        );

        let result = adapter.run(&dataset()).await.unwrap();

        assert_eq!(
            result.get("entry"),
            Some(&AnalysisValue::Scalar(Scalar::Text("perform_analysis".into())))
        );
        assert_eq!(
            result.get("coef"),
            Some(&AnalysisValue::Sequence(vec![
                Scalar::Number(0.5),
                Scalar::Number(1.5)
            ]))
        );
    }

    #[tokio::test]
    async fn dataset_reaches_stdin_as_column_record() {
        let dir = TempDir::new().unwrap();
        let adapter = sh_adapter(&dir, "input=$(cat)\nprintf '{\"echo\": %s}' \"$input\"\n");

        let result = adapter.run(&dataset()).await.unwrap();

        match result.get("echo") {
            Some(AnalysisValue::Mapping(inner)) => assert_eq!(
                inner.get("Close"),
                Some(&AnalysisValue::Sequence(vec![
                    Scalar::Number(100.0),
                    Scalar::Number(101.0),
                    Scalar::Missing
                ]))
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_array_output_is_empty_result() {
        let dir = TempDir::new().unwrap();
        let adapter = sh_adapter(&dir, "cat > /dev/null\necho '[]'\n");
        assert!(adapter.run(&dataset()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scalar_output_is_malformed() {
        let dir = TempDir::new().unwrap();
        let adapter = sh_adapter(&dir, "cat > /dev/null\necho 42\n");
        let err = adapter.run(&dataset()).await.unwrap_err();
        assert!(matches!(err, ExternalEngineError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("analysis.R");
        fs::write(&script, "perform_analysis <- function(d) list()").unwrap();
        let adapter = StatisticalEngineAdapter::rscript(
            "/nonexistent/Rscript",
            script,
            DEFAULT_ENTRY_POINT,
        );
        let err = adapter.run(&dataset()).await.unwrap_err();
        assert!(matches!(err, ExternalEngineError::Unavailable { .. }));
    }
}
