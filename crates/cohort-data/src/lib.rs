//! Cohort retention pipeline.
//!
//! Reads transaction CSV exports, normalizes them, assigns customers to
//! first-purchase cohorts, indexes transactions by months since that cohort,
//! aggregates cohort cells and pivots them into retention and churn matrices.

pub mod aggregator;
pub mod analysis;
pub mod assigner;
pub mod indexer;
pub mod matrix;
pub mod normalizer;
pub mod reader;

pub use cohort_core as core;
