//! Cohort assignment: each customer's first-purchase month.

use std::collections::BTreeMap;

use cohort_core::models::{CleanTransaction, CohortAnchor, CustomerId};
use tracing::debug;

/// Mapping from customer to cohort anchor, computed over the full history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortAssignment {
    anchors: BTreeMap<CustomerId, CohortAnchor>,
}

impl CohortAssignment {
    pub fn anchor_for(&self, customer: &CustomerId) -> Option<CohortAnchor> {
        self.anchors.get(customer).copied()
    }

    pub fn customer_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Number of customers in each cohort, chronologically ordered.
    pub fn cohort_sizes(&self) -> BTreeMap<CohortAnchor, usize> {
        let mut sizes = BTreeMap::new();
        for anchor in self.anchors.values() {
            *sizes.entry(*anchor).or_insert(0) += 1;
        }
        sizes
    }

    pub fn cohort_count(&self) -> usize {
        self.cohort_sizes().len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CustomerId, &CohortAnchor)> {
        self.anchors.iter()
    }
}

/// Compute every customer's anchor as the minimum transaction month.
pub fn assign_cohorts(transactions: &[CleanTransaction]) -> CohortAssignment {
    let mut anchors: BTreeMap<CustomerId, CohortAnchor> = BTreeMap::new();

    for txn in transactions {
        anchors
            .entry(txn.customer_id.clone())
            .and_modify(|anchor| {
                if txn.month < *anchor {
                    *anchor = txn.month;
                }
            })
            .or_insert(txn.month);
    }

    let assignment = CohortAssignment { anchors };
    debug!(
        "Assigned {} customers to {} cohorts",
        assignment.customer_count(),
        assignment.cohort_count()
    );
    assignment
}
