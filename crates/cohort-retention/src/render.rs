//! Text and JSON rendering of cohort reports.
//!
//! Text tables have one row per cohort (labelled `"December 2010"`), one
//! column per period index, and blank cells where a cohort had no activity.

use cohort_core::formatting::{format_cell, format_number, format_percent, month_label};
use cohort_data::analysis::{AnalysisMetadata, CohortReport};
use cohort_data::matrix::{CohortMatrix, DenseMatrix};
use cohort_data::normalizer::NormalizationReport;
use serde::Serialize;

/// How cell values are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStyle {
    Integer,
    Decimal,
    Percent,
}

impl ValueStyle {
    fn format(&self, value: Option<f64>) -> String {
        match self {
            ValueStyle::Integer => format_cell(value, 0),
            ValueStyle::Decimal => format_cell(value, 1),
            ValueStyle::Percent => value.map(format_percent).unwrap_or_default(),
        }
    }
}

/// One matrix selected for output.
pub struct MatrixView<'a> {
    /// Key used by `--metric` and in JSON output.
    pub key: &'static str,
    pub title: &'static str,
    pub matrix: &'a CohortMatrix,
    pub style: ValueStyle,
}

/// Resolve a `--metric` value against a report. `"all"` selects every matrix.
pub fn select_views<'a>(report: &'a CohortReport, metric: &str) -> Vec<MatrixView<'a>> {
    let m = &report.matrices;
    let views = [
        MatrixView {
            key: "count",
            title: "Active customers",
            matrix: &m.customer_count,
            style: ValueStyle::Integer,
        },
        MatrixView {
            key: "retention",
            title: "Retention rate",
            matrix: &m.retention,
            style: ValueStyle::Percent,
        },
        MatrixView {
            key: "churn",
            title: "Churn rate",
            matrix: &m.churn,
            style: ValueStyle::Percent,
        },
        MatrixView {
            key: "quantity-sum",
            title: "Quantity (sum)",
            matrix: &m.quantity_sum,
            style: ValueStyle::Decimal,
        },
        MatrixView {
            key: "quantity-mean",
            title: "Quantity (mean per transaction)",
            matrix: &m.quantity_mean,
            style: ValueStyle::Decimal,
        },
    ];

    views
        .into_iter()
        .filter(|v| metric == "all" || v.key == metric)
        .collect()
}

// ── Text ──────────────────────────────────────────────────────────────────────

/// Render one matrix as an aligned plain-text table.
pub fn render_table(view: &MatrixView<'_>) -> String {
    let dense = view.matrix.to_dense();
    let mut out = format!("{}\n", view.title);

    if dense.rows.is_empty() {
        out.push_str("(no cohorts)\n");
        return out;
    }

    let header: Vec<String> = std::iter::once("Cohort".to_string())
        .chain(dense.columns.iter().map(|p| p.to_string()))
        .collect();
    let body: Vec<Vec<String>> = dense
        .rows
        .iter()
        .zip(&dense.values)
        .map(|(anchor, values)| {
            std::iter::once(month_label(*anchor))
                .chain(values.iter().map(|v| view.style.format(*v)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            std::iter::once(&header)
                .chain(&body)
                .map(|row| row[col].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    for row in std::iter::once(&header).chain(&body) {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                if i == 0 {
                    format!("{:<width$}", cell, width = *width)
                } else {
                    format!("{:>width$}", cell, width = *width)
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

/// Summary lines for the normalization audit.
pub fn render_summary(report: &CohortReport) -> String {
    let n = &report.normalization;
    let mut out = format!(
        "{} rows in, {} retained ({} without customer, {} duplicates, {} returns)\n",
        format_number(n.input_rows as f64, 0),
        format_number(n.retained as f64, 0),
        format_number(n.missing_customer as f64, 0),
        format_number(n.duplicates as f64, 0),
        format_number(n.negative_quantity as f64, 0),
    );
    if let Some(load) = &report.load {
        if load.rows_skipped > 0 {
            out.push_str(&format!(
                "{} undecodable rows skipped while loading\n",
                format_number(load.rows_skipped as f64, 0)
            ));
        }
    }
    out.push_str(&format!(
        "{} customers in {} cohorts\n",
        format_number(report.metadata.customers as f64, 0),
        report.metadata.cohorts
    ));
    out
}

/// Summary followed by every selected table.
pub fn render_text(report: &CohortReport, metric: &str) -> String {
    let mut out = render_summary(report);
    for view in select_views(report, metric) {
        out.push('\n');
        out.push_str(&render_table(&view));
    }
    out
}

// ── JSON ──────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SelectedExport<'a> {
    metadata: &'a AnalysisMetadata,
    normalization: &'a NormalizationReport,
    matrices: Vec<NamedMatrix>,
}

#[derive(Serialize)]
struct NamedMatrix {
    metric: &'static str,
    #[serde(flatten)]
    matrix: DenseMatrix,
}

/// Pretty JSON. `"all"` emits the full report export; a single metric emits
/// only that matrix next to the metadata.
pub fn render_json(report: &CohortReport, metric: &str) -> serde_json::Result<String> {
    if metric == "all" {
        return serde_json::to_string_pretty(&report.export());
    }

    let matrices = select_views(report, metric)
        .into_iter()
        .map(|view| NamedMatrix {
            metric: view.key,
            matrix: match view.style {
                ValueStyle::Decimal => view.matrix.to_dense().rounded(1),
                _ => view.matrix.to_dense(),
            },
        })
        .collect();

    serde_json::to_string_pretty(&SelectedExport {
        metadata: &report.metadata,
        normalization: &report.normalization,
        matrices,
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cohort_core::models::{CustomerId, Transaction};
    use cohort_data::analysis::analyze_transactions;

    fn txn(customer: &str, qty: i64, y: i32, m: u32) -> Transaction {
        Transaction {
            invoice_no: format!("{customer}{y}{m}"),
            stock_code: "85123A".to_string(),
            description: "WHITE HANGING HEART T-LIGHT HOLDER".to_string(),
            quantity: qty,
            invoice_date: NaiveDate::from_ymd_opt(y, m, 1)
                .unwrap()
                .and_hms_opt(8, 26, 0)
                .unwrap(),
            unit_price: 2.55,
            customer_id: CustomerId::parse(customer),
            country: "United Kingdom".to_string(),
        }
    }

    fn report() -> CohortReport {
        analyze_transactions(&[
            txn("C1", 5, 2010, 12),
            txn("C2", 4, 2010, 12),
            txn("C1", 3, 2011, 1),
            txn("C3", 10, 2011, 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_select_views_all_and_single() {
        let report = report();
        assert_eq!(select_views(&report, "all").len(), 5);
        let single = select_views(&report, "churn");
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].key, "churn");
    }

    #[test]
    fn test_render_table_labels_and_blanks() {
        let report = report();
        let views = select_views(&report, "retention");
        let table = render_table(&views[0]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "Retention rate");
        assert!(lines[1].starts_with("Cohort"));
        assert!(lines[2].starts_with("December 2010"));
        assert!(lines[2].contains("100.0%"));
        assert!(lines[2].contains("50.0%"));
        // January cohort has no period 2: the row ends after period 1.
        assert!(lines[3].starts_with("January 2011"));
        assert!(lines[3].trim_end().ends_with("100.0%"));
    }

    #[test]
    fn test_render_table_empty_matrix() {
        let report = analyze_transactions(&[]).unwrap();
        let views = select_views(&report, "count");
        assert!(render_table(&views[0]).contains("(no cohorts)"));
    }

    #[test]
    fn test_render_summary_counts() {
        let summary = render_summary(&report());
        assert!(summary.contains("4 rows in, 4 retained"));
        assert!(summary.contains("3 customers in 2 cohorts"));
    }

    #[test]
    fn test_render_json_single_metric() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&report(), "count").unwrap()).unwrap();
        let matrices = json["matrices"].as_array().unwrap();
        assert_eq!(matrices.len(), 1);
        assert_eq!(matrices[0]["metric"], "count");
        assert_eq!(matrices[0]["values"][0], serde_json::json!([2.0, 1.0]));
        assert_eq!(matrices[0]["values"][1], serde_json::json!([1.0, null]));
    }

    #[test]
    fn test_render_json_all() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&report(), "all").unwrap()).unwrap();
        assert!(json["matrices"]["churn"].is_object());
        assert_eq!(json["normalization"]["retained"], 4);
    }
}
