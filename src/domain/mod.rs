//! Core analysis types and metric routines.

pub mod market;
pub mod config;
pub mod error;
pub mod result;
pub mod bucket;
pub mod concentration;
pub mod activity;
pub mod calibration;
pub mod longshot;
pub mod maker_taker;
pub mod size_dist;
pub mod volume_concentration;
pub mod hourly;
pub mod surface;
pub mod categories;
pub mod monte_carlo;
pub mod kelly;
pub mod registry;
