//! Cohort × period matrices and the retention / churn rates derived from them.
//!
//! A matrix is sparse: a `(cohort, period)` pair with no activity has no
//! value, which is distinct from a value of zero. Absence survives every
//! derivation and is emitted as `null` by [`DenseMatrix`].

use std::collections::{BTreeMap, BTreeSet};

use cohort_core::error::{CohortError, Result};
use cohort_core::formatting::round_to;
use cohort_core::models::CohortAnchor;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::{CohortCell, Statistic};

// ── CohortMatrix ──────────────────────────────────────────────────────────────

/// Rows keyed by cohort anchor, columns keyed by 1-based period index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortMatrix {
    rows: BTreeMap<CohortAnchor, BTreeMap<u32, f64>>,
}

impl CohortMatrix {
    pub fn get(&self, anchor: CohortAnchor, period_index: u32) -> Option<f64> {
        self.rows.get(&anchor)?.get(&period_index).copied()
    }

    pub fn row(&self, anchor: CohortAnchor) -> Option<&BTreeMap<u32, f64>> {
        self.rows.get(&anchor)
    }

    /// Row keys in chronological order.
    pub fn anchors(&self) -> impl Iterator<Item = CohortAnchor> + '_ {
        self.rows.keys().copied()
    }

    /// Every period index present in any row, ascending.
    pub fn periods(&self) -> Vec<u32> {
        let set: BTreeSet<u32> = self.rows.values().flat_map(|r| r.keys().copied()).collect();
        set.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of present cells.
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Iterate present cells as `(anchor, period_index, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (CohortAnchor, u32, f64)> + '_ {
        self.rows
            .iter()
            .flat_map(|(anchor, row)| row.iter().map(move |(p, v)| (*anchor, *p, *v)))
    }

    fn insert(&mut self, anchor: CohortAnchor, period_index: u32, value: f64) {
        self.rows
            .entry(anchor)
            .or_default()
            .insert(period_index, value);
    }

    /// Dense, labelled form with `None` for absent cells.
    pub fn to_dense(&self) -> DenseMatrix {
        let columns = self.periods();
        let values = self
            .rows
            .values()
            .map(|row| columns.iter().map(|p| row.get(p).copied()).collect())
            .collect();
        DenseMatrix {
            rows: self.anchors().collect(),
            columns,
            values,
        }
    }
}

// ── DenseMatrix ───────────────────────────────────────────────────────────────

/// A row- and column-labelled grid handed to renderers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    /// Cohort anchors, chronological.
    pub rows: Vec<CohortAnchor>,
    /// Period indices, ascending.
    pub columns: Vec<u32>,
    /// `values[r][c]` for `rows[r]` and `columns[c]`; `None` where absent.
    pub values: Vec<Vec<Option<f64>>>,
}

impl DenseMatrix {
    /// Copy with every present value rounded to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> DenseMatrix {
        DenseMatrix {
            rows: self.rows.clone(),
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .map(|row| row.iter().map(|v| v.map(|x| round_to(x, decimals))).collect())
                .collect(),
        }
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Pivot one statistic of `cells` into a matrix.
pub fn build_matrix(cells: &[CohortCell], statistic: Statistic) -> CohortMatrix {
    let mut matrix = CohortMatrix::default();
    for cell in cells {
        matrix.insert(cell.anchor, cell.period_index, statistic.value(cell));
    }
    matrix
}

/// Normalize each row of a customer-count matrix by its period-1 value.
///
/// A cell is present only when both it and the row's period-1 value are
/// present and the period-1 value is positive. Every produced row is checked
/// to hold exactly `1.0` at period 1.
pub fn retention_matrix(counts: &CohortMatrix) -> Result<CohortMatrix> {
    let mut retention = CohortMatrix::default();

    for (anchor, row) in &counts.rows {
        let Some(base) = row.get(&1).copied().filter(|b| *b > 0.0) else {
            debug!("Cohort {} has no period-1 customers; retention row omitted", anchor);
            continue;
        };

        for (period, count) in row {
            retention.insert(*anchor, *period, count / base);
        }

        // Holds whenever base > 0; guards the invariant, not an expected path.
        let first = retention.get(*anchor, 1).unwrap_or(f64::NAN);
        if first != 1.0 {
            return Err(CohortError::RetentionBaseline {
                anchor: *anchor,
                value: first,
            });
        }
    }

    Ok(retention)
}

/// `1 - retention` wherever retention is defined.
pub fn churn_matrix(retention: &CohortMatrix) -> CohortMatrix {
    let mut churn = CohortMatrix::default();
    for (anchor, period, rate) in retention.iter() {
        churn.insert(anchor, period, 1.0 - rate);
    }
    churn
}

// ── CohortMatrices ────────────────────────────────────────────────────────────

/// Every matrix the pipeline produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortMatrices {
    pub customer_count: CohortMatrix,
    pub retention: CohortMatrix,
    pub churn: CohortMatrix,
    pub quantity_sum: CohortMatrix,
    pub quantity_mean: CohortMatrix,
}

impl CohortMatrices {
    pub fn from_cells(cells: &[CohortCell]) -> Result<Self> {
        let customer_count = build_matrix(cells, Statistic::CustomerCount);
        let retention = retention_matrix(&customer_count)?;
        let churn = churn_matrix(&retention);

        Ok(Self {
            customer_count,
            retention,
            churn,
            quantity_sum: build_matrix(cells, Statistic::QuantitySum),
            quantity_mean: build_matrix(cells, Statistic::QuantityMean),
        })
    }

    /// Dense export; quantity matrices are rounded to one decimal place.
    pub fn to_dense(&self) -> DenseMatrices {
        DenseMatrices {
            customer_count: self.customer_count.to_dense(),
            retention: self.retention.to_dense(),
            churn: self.churn.to_dense(),
            quantity_sum: self.quantity_sum.to_dense().rounded(1),
            quantity_mean: self.quantity_mean.to_dense().rounded(1),
        }
    }
}

/// Serializable form of [`CohortMatrices`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrices {
    pub customer_count: DenseMatrix,
    pub retention: DenseMatrix,
    pub churn: DenseMatrix,
    pub quantity_sum: DenseMatrix,
    pub quantity_mean: DenseMatrix,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
