//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod engine_session;
pub mod file_config_adapter;
pub mod file_data_adapter;
pub mod json_report_adapter;
pub mod parquet_adapter;
pub mod simulation_engine;
pub mod statistical_engine;
