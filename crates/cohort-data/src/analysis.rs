//! Main cohort analysis pipeline.
//!
//! Composes normalization, cohort assignment, period indexing, aggregation and
//! matrix building, returning a [`CohortReport`] ready for rendering.

use std::path::Path;

use chrono::Utc;
use cohort_core::error::Result;
use cohort_core::models::Transaction;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregator::{CohortAggregator, CohortCell, CohortTotals};
use crate::assigner::assign_cohorts;
use crate::indexer::index_transactions;
use crate::matrix::{CohortMatrices, DenseMatrices};
use crate::normalizer::{normalize, NormalizationReport};
use crate::reader::{load_transactions, LoadReport};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Distinct customers with at least one clean transaction.
    pub customers: usize,
    /// Distinct cohort anchors.
    pub cohorts: usize,
    /// Transactions that reached the aggregator.
    pub transactions_indexed: usize,
    /// Number of `(cohort, period)` cells.
    pub cells: usize,
    /// Wall-clock seconds spent loading input files, when loaded from disk.
    pub load_time_seconds: Option<f64>,
    /// Wall-clock seconds spent in the transform pipeline.
    pub transform_time_seconds: f64,
}

/// The complete output of a cohort analysis.
#[derive(Debug, Clone)]
pub struct CohortReport {
    pub matrices: CohortMatrices,
    pub cells: Vec<CohortCell>,
    pub totals: CohortTotals,
    pub normalization: NormalizationReport,
    /// Present when the transactions were read from CSV.
    pub load: Option<LoadReport>,
    pub metadata: AnalysisMetadata,
}

/// Serializable summary of a [`CohortReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportExport {
    pub metadata: AnalysisMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadReport>,
    pub normalization: NormalizationReport,
    pub totals: CohortTotals,
    pub matrices: DenseMatrices,
}

impl CohortReport {
    pub fn export(&self) -> ReportExport {
        ReportExport {
            metadata: self.metadata.clone(),
            load: self.load,
            normalization: self.normalization,
            totals: self.totals,
            matrices: self.matrices.to_dense(),
        }
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline over in-memory transactions.
///
/// 1. Normalize (drop missing-customer, duplicate and return rows).
/// 2. Assign each customer to a cohort.
/// 3. Index every transaction by period.
/// 4. Aggregate into cohort cells.
/// 5. Build count, retention, churn and quantity matrices.
///
/// Empty input yields empty matrices. Invariant violations in steps 3 and 5
/// and quantity sums that overflow `u64` in step 4 are returned as errors.
pub fn analyze_transactions(records: &[Transaction]) -> Result<CohortReport> {
    let transform_start = std::time::Instant::now();

    // ── Step 1: Normalize ─────────────────────────────────────────────────────
    let normalized = normalize(records);

    // ── Step 2: Cohorts ───────────────────────────────────────────────────────
    let assignment = assign_cohorts(&normalized.transactions);

    // ── Step 3: Period index ──────────────────────────────────────────────────
    let indexed = index_transactions(&normalized.transactions, &assignment)?;

    // ── Step 4: Aggregate ─────────────────────────────────────────────────────
    let cells = CohortAggregator::aggregate(&indexed)?;
    let totals = CohortAggregator::calculate_totals(&cells)?;

    // ── Step 5: Matrices ──────────────────────────────────────────────────────
    let matrices = CohortMatrices::from_cells(&cells)?;

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        customers: assignment.customer_count(),
        cohorts: assignment.cohort_count(),
        transactions_indexed: indexed.len(),
        cells: cells.len(),
        load_time_seconds: None,
        transform_time_seconds: transform_start.elapsed().as_secs_f64(),
    };

    info!(
        "Cohort analysis: {} of {} rows retained, {} customers in {} cohorts",
        normalized.report.retained,
        normalized.report.input_rows,
        metadata.customers,
        metadata.cohorts,
    );

    Ok(CohortReport {
        matrices,
        cells,
        totals,
        normalization: normalized.report,
        load: None,
        metadata,
    })
}

/// Load CSV input from `path` (file or directory) and analyze it.
pub fn analyze_path(path: &Path) -> Result<CohortReport> {
    let load_start = std::time::Instant::now();
    let (records, load) = load_transactions(path)?;
    let load_time = load_start.elapsed().as_secs_f64();

    info!(
        "Loaded {} transactions from {} file(s)",
        records.len(),
        load.files_read
    );

    let mut report = analyze_transactions(&records)?;
    report.load = Some(load);
    report.metadata.load_time_seconds = Some(load_time);
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
