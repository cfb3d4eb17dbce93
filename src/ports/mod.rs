//! Port traits: the seams between the pipeline and the outside world.

pub mod analysis_port;
pub mod config_port;
pub mod data_port;
pub mod report_port;
