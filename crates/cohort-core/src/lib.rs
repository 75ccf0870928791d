//! Shared types for the cohort retention workspace.
//!
//! Transaction and cohort models, the error type, timestamp parsing,
//! display formatting and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{CohortError, Result};
