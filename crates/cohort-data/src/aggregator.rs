//! Cohort aggregation over (anchor, period index) cells.

use std::collections::{BTreeMap, HashSet};

use cohort_core::error::{CohortError, Result};
use cohort_core::models::{CohortAnchor, CustomerId, IndexedTransaction};
use serde::{Deserialize, Serialize};

// ── Statistic ─────────────────────────────────────────────────────────────────

/// A per-cell value that can be pivoted into a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    /// Distinct customers active in the cell.
    CustomerCount,
    /// Total units purchased in the cell.
    QuantitySum,
    /// Units per transaction in the cell.
    QuantityMean,
}

impl Statistic {
    pub const ALL: [Statistic; 3] = [
        Statistic::CustomerCount,
        Statistic::QuantitySum,
        Statistic::QuantityMean,
    ];

    /// Full-precision value of this statistic for `cell`.
    pub fn value(&self, cell: &CohortCell) -> f64 {
        match self {
            Statistic::CustomerCount => cell.customer_count as f64,
            Statistic::QuantitySum => cell.quantity_sum as f64,
            Statistic::QuantityMean => cell.quantity_mean(),
        }
    }
}

// ── CohortCell ────────────────────────────────────────────────────────────────

/// Aggregated statistics for one cohort at one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortCell {
    pub anchor: CohortAnchor,
    pub period_index: u32,
    pub customer_count: usize,
    pub quantity_sum: u64,
    pub transaction_count: usize,
    /// Customer count of this cohort's period-1 cell.
    pub cohort_size: usize,
}

impl CohortCell {
    /// Mean quantity per transaction (not per customer).
    pub fn quantity_mean(&self) -> f64 {
        if self.transaction_count == 0 {
            return 0.0;
        }
        self.quantity_sum as f64 / self.transaction_count as f64
    }
}

/// Running totals for one cell while aggregating.
#[derive(Debug, Default)]
struct CellAccumulator {
    customers: HashSet<CustomerId>,
    quantity_sum: u64,
    transaction_count: usize,
}

impl CellAccumulator {
    fn add_entry(&mut self, txn: &IndexedTransaction) -> Result<()> {
        if !self.customers.contains(txn.customer_id()) {
            self.customers.insert(txn.customer_id().clone());
        }
        self.quantity_sum = self
            .quantity_sum
            .checked_add(txn.quantity())
            .ok_or_else(|| CohortError::QuantityOverflow {
                anchor: txn.anchor,
                period_index: Some(txn.period_index),
            })?;
        self.transaction_count += 1;
        Ok(())
    }
}

// ── CohortTotals ──────────────────────────────────────────────────────────────

/// Dataset-wide totals derived from a set of cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortTotals {
    /// Distinct customers; each belongs to exactly one cohort.
    pub customers: usize,
    pub cohorts: usize,
    pub quantity: u64,
    pub transactions: usize,
}

// ── CohortAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that groups indexed transactions into cohort cells.
pub struct CohortAggregator;

impl CohortAggregator {
    /// One cell per distinct `(anchor, period_index)` in `transactions`,
    /// sorted by anchor then period index. Independent of input order.
    ///
    /// Fails with [`CohortError::QuantityOverflow`] when a cell's quantity
    /// sum does not fit in a `u64`.
    pub fn aggregate(transactions: &[IndexedTransaction]) -> Result<Vec<CohortCell>> {
        let mut map: BTreeMap<(CohortAnchor, u32), CellAccumulator> = BTreeMap::new();

        for txn in transactions {
            map.entry((txn.anchor, txn.period_index))
                .or_default()
                .add_entry(txn)?;
        }

        let cohort_sizes: BTreeMap<CohortAnchor, usize> = map
            .iter()
            .filter(|((_, period), _)| *period == 1)
            .map(|((anchor, _), acc)| (*anchor, acc.customers.len()))
            .collect();

        let cells = map
            .into_iter()
            .map(|((anchor, period_index), acc)| CohortCell {
                anchor,
                period_index,
                customer_count: acc.customers.len(),
                quantity_sum: acc.quantity_sum,
                transaction_count: acc.transaction_count,
                cohort_size: cohort_sizes.get(&anchor).copied().unwrap_or(0),
            })
            .collect();
        Ok(cells)
    }

    /// Sum up cells into a single [`CohortTotals`].
    pub fn calculate_totals(cells: &[CohortCell]) -> Result<CohortTotals> {
        let mut totals = CohortTotals::default();
        for cell in cells {
            if cell.period_index == 1 {
                totals.customers += cell.customer_count;
                totals.cohorts += 1;
            }
            totals.quantity = totals
                .quantity
                .checked_add(cell.quantity_sum)
                .ok_or(CohortError::QuantityOverflow {
                    anchor: cell.anchor,
                    period_index: None,
                })?;
            totals.transactions += cell.transaction_count;
        }
        Ok(totals)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
