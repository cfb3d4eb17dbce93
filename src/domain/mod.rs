//! Core domain types and logic.

pub mod analysis;
pub mod backtest;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod metrics;
pub mod pipeline;
pub mod report;
