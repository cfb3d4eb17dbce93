//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    /// A configuration with no keys; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[pipeline]
data_file = prices.csv
file_type = parquet

[engines]
statistical_entry_point = fit_model
timeout_secs = 30
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("pipeline", "data_file"),
            Some("prices.csv".to_string())
        );
        assert_eq!(
            adapter.get_string("engines", "statistical_entry_point"),
            Some("fit_model".to_string())
        );
        assert_eq!(
            adapter.get_string("engines", "timeout_secs"),
            Some("30".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[pipeline]\nfile_type = csv\n").unwrap();
        assert_eq!(adapter.get_string("pipeline", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_path_trims_and_skips_blank() {
        let adapter = FileConfigAdapter::from_string(
            "[engines]\nstatistical_script_path =  scripts/analysis.R \nsimulation_script_path =\n",
        )
        .unwrap();
        assert_eq!(
            adapter.get_path("engines", "statistical_script_path"),
            Some(PathBuf::from("scripts/analysis.R"))
        );
        assert_eq!(adapter.get_path("engines", "simulation_script_path"), None);
    }

    #[test]
    fn empty_has_no_keys() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_string("pipeline", "data_file"), None);
        assert_eq!(adapter.get_path("engines", "statistical_script_path"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[pipeline]\noutput = /tmp/report.json\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("pipeline", "output"),
            Some("/tmp/report.json".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
