//! JSON report adapter implementing ReportPort.

use std::fs;
use std::path::Path;

use crate::domain::error::FusetraderError;
use crate::domain::report::CombinedReport;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &CombinedReport, output_path: &Path) -> Result<(), FusetraderError> {
        let report_error = |reason: String| FusetraderError::Report {
            path: output_path.display().to_string(),
            reason,
        };

        let json = serde_json::to_vec_pretty(report).map_err(|e| report_error(e.to_string()))?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| report_error(e.to_string()))?;
        }
        fs::write(output_path, json).map_err(|e| report_error(e.to_string()))?;

        Ok(())
    }
}
