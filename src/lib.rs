//! marketlens: batch analytics over prediction-market trade history.
//!
//! Hexagonal architecture: analysis logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
