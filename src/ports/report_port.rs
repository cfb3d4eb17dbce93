//! Report output port trait.

use crate::domain::error::FusetraderError;
use crate::domain::report::CombinedReport;
use std::path::Path;

/// Port for persisting a combined report.
pub trait ReportPort {
    fn write(&self, report: &CombinedReport, output_path: &Path) -> Result<(), FusetraderError>;
}
