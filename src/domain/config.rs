//! Pipeline configuration.
//!
//! Every key is optional. Values are read through [`ConfigPort`], may be
//! overridden by the caller, and are checked by [`validate_pipeline_config`]
//! before a run starts.

use crate::domain::dataset::FileFormat;
use crate::domain::error::FusetraderError;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATA_FILE: &str = "data.csv";
pub const DEFAULT_FILE_TYPE: &str = "csv";
pub const DEFAULT_STATISTICAL_SCRIPT: &str = "analysis.R";
pub const DEFAULT_ENTRY_POINT: &str = "perform_analysis";
pub const DEFAULT_STATISTICAL_PROGRAM: &str = "Rscript";
pub const DEFAULT_SIMULATION_SCRIPT: &str = "simulation.m";
pub const DEFAULT_SIMULATION_PROGRAM: &str = "octave";
pub const DEFAULT_TIMEOUT_SECS: i64 = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_file: PathBuf,
    pub file_type: String,
    pub output: Option<PathBuf>,
    pub statistical_script_path: PathBuf,
    pub statistical_entry_point: String,
    pub statistical_program: String,
    pub simulation_script_path: PathBuf,
    pub simulation_program: String,
    pub timeout_secs: i64,
}

impl PipelineConfig {
    /// Per-invocation deadline for each external engine.
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(0) as u64)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            file_type: DEFAULT_FILE_TYPE.to_string(),
            output: None,
            statistical_script_path: PathBuf::from(DEFAULT_STATISTICAL_SCRIPT),
            statistical_entry_point: DEFAULT_ENTRY_POINT.to_string(),
            statistical_program: DEFAULT_STATISTICAL_PROGRAM.to_string(),
            simulation_script_path: PathBuf::from(DEFAULT_SIMULATION_SCRIPT),
            simulation_program: DEFAULT_SIMULATION_PROGRAM.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

pub fn build_pipeline_config(adapter: &dyn ConfigPort) -> Result<PipelineConfig, FusetraderError> {
    let defaults = PipelineConfig::default();
    let string_or = |section: &str, key: &str, default: String| {
        adapter
            .get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
    };

    let timeout_secs = match adapter.get_string("engines", "timeout_secs") {
        None => defaults.timeout_secs,
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| FusetraderError::ConfigInvalid {
            section: "engines".into(),
            key: "timeout_secs".into(),
            reason: format!("expected a whole number of seconds, got '{}'", raw.trim()),
        })?,
    };

    Ok(PipelineConfig {
        data_file: adapter
            .get_path("pipeline", "data_file")
            .unwrap_or(defaults.data_file),
        file_type: string_or("pipeline", "file_type", defaults.file_type),
        output: adapter.get_path("pipeline", "output"),
        statistical_script_path: adapter
            .get_path("engines", "statistical_script_path")
            .unwrap_or(defaults.statistical_script_path),
        statistical_entry_point: adapter
            .get_string("engines", "statistical_entry_point")
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.statistical_entry_point),
        statistical_program: string_or(
            "engines",
            "statistical_program",
            defaults.statistical_program,
        ),
        simulation_script_path: adapter
            .get_path("engines", "simulation_script_path")
            .unwrap_or(defaults.simulation_script_path),
        simulation_program: string_or("engines", "simulation_program", defaults.simulation_program),
        timeout_secs,
    })
}

pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), FusetraderError> {
    validate_file_type(config)?;
    validate_data_file(config)?;
    validate_entry_point(config)?;
    validate_timeout(config)?;
    Ok(())
}

fn validate_file_type(config: &PipelineConfig) -> Result<(), FusetraderError> {
    config
        .file_type
        .parse::<FileFormat>()
        .map(|_| ())
        .map_err(|_| FusetraderError::ConfigInvalid {
            section: "pipeline".to_string(),
            key: "file_type".to_string(),
            reason: format!("unsupported file type '{}' (expected csv or parquet)", config.file_type),
        })
}

fn validate_data_file(config: &PipelineConfig) -> Result<(), FusetraderError> {
    if config.data_file.as_os_str().is_empty() {
        return Err(FusetraderError::ConfigInvalid {
            section: "pipeline".to_string(),
            key: "data_file".to_string(),
            reason: "data_file must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_entry_point(config: &PipelineConfig) -> Result<(), FusetraderError> {
    if config.statistical_entry_point.trim().is_empty() {
        return Err(FusetraderError::ConfigInvalid {
            section: "engines".to_string(),
            key: "statistical_entry_point".to_string(),
            reason: "statistical_entry_point must not be blank".to_string(),
        });
    }
    Ok(())
}

fn validate_timeout(config: &PipelineConfig) -> Result<(), FusetraderError> {
    if config.timeout_secs <= 0 {
        return Err(FusetraderError::ConfigInvalid {
            section: "engines".to_string(),
            key: "timeout_secs".to_string(),
            reason: "timeout_secs must be positive".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn config_from(content: &str) -> Result<PipelineConfig, FusetraderError> {
        build_pipeline_config(&FileConfigAdapter::from_string(content).unwrap())
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = build_pipeline_config(&FileConfigAdapter::empty()).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.data_file, PathBuf::from("data.csv"));
        assert_eq!(config.statistical_entry_point, "perform_analysis");
        assert_eq!(config.engine_timeout(), Duration::from_secs(120));
        assert!(validate_pipeline_config(&config).is_ok());
    }

    #[test]
    fn reads_all_keys() {
        let config = config_from(
            r#"
[pipeline]
data_file = prices.parquet
file_type = parquet
output = out/report.json

[engines]
statistical_script_path = r/model.R
statistical_entry_point = fit
statistical_program = /usr/bin/Rscript
simulation_script_path = m/sim.m
simulation_program = matlab
timeout_secs = 15
"#,
        )
        .unwrap();

        assert_eq!(config.data_file, PathBuf::from("prices.parquet"));
        assert_eq!(config.file_type, "parquet");
        assert_eq!(config.output, Some(PathBuf::from("out/report.json")));
        assert_eq!(config.statistical_script_path, PathBuf::from("r/model.R"));
        assert_eq!(config.statistical_entry_point, "fit");
        assert_eq!(config.statistical_program, "/usr/bin/Rscript");
        assert_eq!(config.simulation_script_path, PathBuf::from("m/sim.m"));
        assert_eq!(config.simulation_program, "matlab");
        assert_eq!(config.engine_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn non_numeric_timeout_is_invalid() {
        let err = config_from("[engines]\ntimeout_secs = forever\n").unwrap_err();
        assert!(matches!(err, FusetraderError::ConfigInvalid { key, .. } if key == "timeout_secs"));
    }

    #[test]
    fn validate_rejects_unknown_file_type() {
        let config = PipelineConfig {
            file_type: "xlsx".into(),
            ..PipelineConfig::default()
        };
        let err = validate_pipeline_config(&config).unwrap_err();
        assert!(matches!(err, FusetraderError::ConfigInvalid { key, .. } if key == "file_type"));
    }

    #[test]
    fn validate_accepts_uppercase_file_type() {
        let config = PipelineConfig {
            file_type: "PARQUET".into(),
            ..PipelineConfig::default()
        };
        assert!(validate_pipeline_config(&config).is_ok());
    }

    #[test]
    fn validate_rejects_blank_entry_point() {
        let config = PipelineConfig {
            statistical_entry_point: "  ".into(),
            ..PipelineConfig::default()
        };
        let err = validate_pipeline_config(&config).unwrap_err();
        assert!(
            matches!(err, FusetraderError::ConfigInvalid { key, .. } if key == "statistical_entry_point")
        );
    }

    #[test]
    fn validate_rejects_non_positive_timeout() {
        for secs in [0, -5] {
            let config = PipelineConfig {
                timeout_secs: secs,
                ..PipelineConfig::default()
            };
            let err = validate_pipeline_config(&config).unwrap_err();
            assert!(matches!(err, FusetraderError::ConfigInvalid { key, .. } if key == "timeout_secs"));
        }
    }

    #[test]
    fn validate_rejects_empty_data_file() {
        let config = PipelineConfig {
            data_file: PathBuf::new(),
            ..PipelineConfig::default()
        };
        let err = validate_pipeline_config(&config).unwrap_err();
        assert!(matches!(err, FusetraderError::ConfigInvalid { key, .. } if key == "data_file"));
    }
}
