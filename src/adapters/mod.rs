//! Concrete adapter implementations for ports.

pub mod csv_store;
pub mod file_config;
pub mod json_artifact;
pub mod svg_chart;
#[cfg(feature = "web")]
pub mod web;
