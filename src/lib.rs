//! Cogload - cognitive load and cohesion analysis
//!
//! A local-first analysis engine that scores structural code models
//! against role-aware cognitive load ceilings, partitions member/method
//! usage graphs to find cohesion drift, and folds in co-change history
//! to flag scattered responsibilities.

pub mod analysis;
pub mod cli;
pub mod cochange;
pub mod config;
pub mod errors;
pub mod models;
pub mod report;
pub mod source;
