//! Core domain types and logic.

pub mod price;
pub mod signal;
pub mod strategy;
pub mod position;
pub mod cooling;
pub mod portfolio;
pub mod simulator;
pub mod metrics;
pub mod recovery;
pub mod trend;
pub mod universe;
pub mod config_validation;
pub mod error;
