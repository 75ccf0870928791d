//! Record normalization: drops noise rows and truncates timestamps to months.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use cohort_core::models::{CleanTransaction, CustomerId, Transaction, YearMonth};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Counts of rows discarded by [`normalize`], one reason per row.
///
/// Reasons are checked in field order: missing customer, duplicate,
/// negative quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub input_rows: usize,
    pub missing_customer: usize,
    pub duplicates: usize,
    pub negative_quantity: usize,
    pub retained: usize,
}

impl NormalizationReport {
    pub fn dropped(&self) -> usize {
        self.missing_customer + self.duplicates + self.negative_quantity
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct NormalizedTransactions {
    pub transactions: Vec<CleanTransaction>,
    pub report: NormalizationReport,
}

/// Full-row identity used for duplicate detection.
///
/// Prices compare by bit pattern so the key can be hashed.
#[derive(PartialEq, Eq, Hash)]
struct RecordKey<'a> {
    invoice_no: &'a str,
    stock_code: &'a str,
    description: &'a str,
    quantity: i64,
    invoice_date: NaiveDateTime,
    unit_price: u64,
    customer_id: &'a CustomerId,
    country: &'a str,
}

impl<'a> RecordKey<'a> {
    fn new(txn: &'a Transaction, customer_id: &'a CustomerId) -> Self {
        Self {
            invoice_no: &txn.invoice_no,
            stock_code: &txn.stock_code,
            description: &txn.description,
            quantity: txn.quantity,
            invoice_date: txn.invoice_date,
            unit_price: txn.unit_price.to_bits(),
            customer_id,
            country: &txn.country,
        }
    }
}

/// Clean a raw transaction sequence.
///
/// * Rows without a customer are dropped.
/// * Exact duplicates are dropped; the first occurrence is kept.
/// * Rows with a negative quantity (returns) are dropped. Zero is kept.
/// * Each surviving row carries its `(year, month)`.
///
/// Input order is preserved among retained rows. Never fails.
pub fn normalize(records: &[Transaction]) -> NormalizedTransactions {
    let mut report = NormalizationReport {
        input_rows: records.len(),
        ..NormalizationReport::default()
    };
    let mut seen: HashSet<RecordKey<'_>> = HashSet::with_capacity(records.len());
    let mut transactions = Vec::with_capacity(records.len());

    for txn in records {
        let Some(customer_id) = txn.customer_id.as_ref() else {
            report.missing_customer += 1;
            continue;
        };

        if !seen.insert(RecordKey::new(txn, customer_id)) {
            report.duplicates += 1;
            continue;
        }

        let Ok(quantity) = u64::try_from(txn.quantity) else {
            report.negative_quantity += 1;
            continue;
        };

        transactions.push(CleanTransaction {
            invoice_no: txn.invoice_no.clone(),
            stock_code: txn.stock_code.clone(),
            description: txn.description.clone(),
            quantity,
            invoice_date: txn.invoice_date,
            unit_price: txn.unit_price,
            customer_id: customer_id.clone(),
            country: txn.country.clone(),
            month: YearMonth::from_datetime(&txn.invoice_date),
        });
    }

    report.retained = transactions.len();
    debug!(
        "Normalized {} rows: {} retained, {} without customer, {} duplicates, {} returns",
        report.input_rows,
        report.retained,
        report.missing_customer,
        report.duplicates,
        report.negative_quantity,
    );

    NormalizedTransactions {
        transactions,
        report,
    }
}
