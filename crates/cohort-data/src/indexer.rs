//! Period indexing: months elapsed since each customer's cohort anchor.

use cohort_core::error::{CohortError, Result};
use cohort_core::models::{CleanTransaction, CohortAnchor, IndexedTransaction, YearMonth};

use crate::assigner::CohortAssignment;

/// 1-based period index of `month` relative to `anchor`.
///
/// `(month.year - anchor.year) * 12 + (month.month - anchor.month) + 1`.
/// Returns values below 1 unchanged; callers decide how to treat them.
pub fn period_index(month: YearMonth, anchor: CohortAnchor) -> i64 {
    month.months_since(anchor) + 1
}

/// Join every transaction with its customer's anchor and period index.
///
/// Fails on the first transaction whose customer has no anchor or whose month
/// precedes the anchor. Both indicate a defect in anchor computation and are
/// never clamped.
pub fn index_transactions(
    transactions: &[CleanTransaction],
    assignment: &CohortAssignment,
) -> Result<Vec<IndexedTransaction>> {
    transactions
        .iter()
        .map(|txn| index_transaction(txn, assignment))
        .collect()
}

fn index_transaction(
    txn: &CleanTransaction,
    assignment: &CohortAssignment,
) -> Result<IndexedTransaction> {
    let anchor = assignment
        .anchor_for(&txn.customer_id)
        .ok_or_else(|| CohortError::MissingAnchor {
            customer: txn.customer_id.to_string(),
        })?;

    let index = period_index(txn.month, anchor);
    if index < 1 {
        return Err(CohortError::PeriodBeforeAnchor {
            customer: txn.customer_id.to_string(),
            anchor,
            month: txn.month,
            period_index: index,
        });
    }

    Ok(IndexedTransaction {
        transaction: txn.clone(),
        anchor,
        period_index: u32::try_from(index).map_err(|_| CohortError::PeriodOverflow(index))?,
    })
}
