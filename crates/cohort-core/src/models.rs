use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── YearMonth ─────────────────────────────────────────────────────────────────

/// A calendar month at `(year, month)` granularity.
///
/// Used both as a transaction's month and as a customer's cohort anchor.
/// Ordering is chronological: by year, then by month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// Month of the year, `1..=12`.
    pub month: u32,
}

/// The first-purchase month of a customer.
pub type CohortAnchor = YearMonth;

impl YearMonth {
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Truncate a timestamp to its calendar month.
    pub fn from_datetime(ts: &NaiveDateTime) -> Self {
        Self::new(ts.year(), ts.month())
    }

    /// Signed number of whole months from `earlier` to `self`.
    ///
    /// `2011-03.months_since(2010-12) == 3`; negative when `self` precedes
    /// `earlier`.
    pub fn months_since(&self, earlier: YearMonth) -> i64 {
        (i64::from(self.year) - i64::from(earlier.year)) * 12
            + (i64::from(self.month) - i64::from(earlier.month))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ── CustomerId ────────────────────────────────────────────────────────────────

/// A non-empty customer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Build an identifier from a raw cell value.
    ///
    /// Surrounding whitespace is trimmed. Numeric ids exported as floats
    /// (`"17850.0"`) are reduced to their integer form (`"17850"`). Returns
    /// `None` for empty or null-like values (`""`, `"nan"`, `"null"`).
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower == "nan" || lower == "null" || lower == "none" {
            return None;
        }

        let id = match trimmed.strip_suffix(".0") {
            Some(int_part)
                if !int_part.is_empty() && int_part.chars().all(|c| c.is_ascii_digit()) =>
            {
                int_part
            }
            _ => trimmed,
        };
        Some(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// A single raw line item from a transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Invoice identifier; several line items share one invoice.
    pub invoice_no: String,
    /// Product (stock) code.
    pub stock_code: String,
    /// Product description.
    pub description: String,
    /// Units purchased; negative for returns.
    pub quantity: i64,
    /// Timestamp of the invoice.
    pub invoice_date: NaiveDateTime,
    /// Price per unit.
    pub unit_price: f64,
    /// Customer identifier, when one was recorded.
    pub customer_id: Option<CustomerId>,
    /// Customer's country of residence.
    pub country: String,
}

/// A transaction that survived normalization.
///
/// Always has a customer and a non-negative quantity, and carries the
/// calendar month its timestamp falls in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanTransaction {
    pub invoice_no: String,
    pub stock_code: String,
    pub description: String,
    pub quantity: u64,
    pub invoice_date: NaiveDateTime,
    pub unit_price: f64,
    pub customer_id: CustomerId,
    pub country: String,
    /// `invoice_date` truncated to `(year, month)`.
    pub month: YearMonth,
}

/// A clean transaction joined with its customer's cohort anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedTransaction {
    pub transaction: CleanTransaction,
    pub anchor: CohortAnchor,
    /// Months since `anchor`, 1-based. Always `>= 1`.
    pub period_index: u32,
}

impl IndexedTransaction {
    pub fn customer_id(&self) -> &CustomerId {
        &self.transaction.customer_id
    }

    pub fn quantity(&self) -> u64 {
        self.transaction.quantity
    }
}
