//! CSV discovery and loading.
//!
//! Reads Online-Retail-style transaction exports and converts each row into a
//! raw [`Transaction`]. Rows that cannot be decoded are skipped and counted;
//! a file that cannot be opened is an error.

use std::io::Read;
use std::path::{Path, PathBuf};

use cohort_core::error::{CohortError, Result};
use cohort_core::models::{CustomerId, Transaction};
use cohort_core::time_utils::parse_timestamp;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ── LoadReport ────────────────────────────────────────────────────────────────

/// Row accounting for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub files_read: usize,
    pub rows_read: usize,
    /// Rows that could not be decoded (bad numbers, unparseable dates, short rows).
    pub rows_skipped: usize,
}

impl LoadReport {
    fn merge(&mut self, other: LoadReport) {
        self.files_read += other.files_read;
        self.rows_read += other.rows_read;
        self.rows_skipped += other.rows_skipped;
    }
}

// ── Row layout ────────────────────────────────────────────────────────────────

/// One CSV row. Aliases cover the "Online Retail II" column spelling.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "InvoiceNo", alias = "Invoice")]
    invoice_no: String,
    #[serde(rename = "StockCode")]
    stock_code: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Quantity")]
    quantity: i64,
    #[serde(rename = "InvoiceDate")]
    invoice_date: String,
    #[serde(rename = "UnitPrice", alias = "Price")]
    unit_price: f64,
    #[serde(rename = "CustomerID", alias = "Customer ID", default)]
    customer_id: Option<String>,
    #[serde(rename = "Country", default)]
    country: String,
}

impl CsvRow {
    fn into_transaction(self) -> Result<Transaction> {
        Ok(Transaction {
            invoice_date: parse_timestamp(&self.invoice_date)?,
            customer_id: self.customer_id.as_deref().and_then(CustomerId::parse),
            invoice_no: self.invoice_no,
            stock_code: self.stock_code,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            country: self.country,
        })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `data_path`, sorted by path.
pub fn find_csv_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Decode transactions from any CSV source with a header row.
///
/// Invalid UTF-8 is replaced rather than rejected, since retail exports are
/// frequently Latin-1 encoded.
pub fn read_transactions<R: Read>(source: R) -> Result<(Vec<Transaction>, LoadReport)> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);

    let headers = csv::StringRecord::from_byte_record_lossy(reader.byte_headers()?.clone());

    let mut transactions = Vec::new();
    let mut report = LoadReport {
        files_read: 1,
        ..LoadReport::default()
    };

    for (line, record) in reader.byte_records().enumerate() {
        report.rows_read += 1;
        let row = match record {
            Ok(bytes) => csv::StringRecord::from_byte_record_lossy(bytes),
            Err(e) => {
                debug!("Skipping unreadable CSV row {}: {}", line + 2, e);
                report.rows_skipped += 1;
                continue;
            }
        };

        let decoded = row
            .deserialize::<CsvRow>(Some(&headers))
            .map_err(CohortError::from)
            .and_then(CsvRow::into_transaction);

        match decoded {
            Ok(txn) => transactions.push(txn),
            Err(e) => {
                debug!("Skipping CSV row {}: {}", line + 2, e);
                report.rows_skipped += 1;
            }
        }
    }

    Ok((transactions, report))
}

/// Load transactions from a CSV file, or from every CSV file under a
/// directory (in path order).
pub fn load_transactions(path: &Path) -> Result<(Vec<Transaction>, LoadReport)> {
    if !path.exists() {
        return Err(CohortError::InputNotFound(path.to_path_buf()));
    }

    let files = if path.is_dir() {
        let files = find_csv_files(path);
        if files.is_empty() {
            return Err(CohortError::NoDataFiles(path.to_path_buf()));
        }
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut all = Vec::new();
    let mut report = LoadReport::default();

    for file_path in &files {
        let file = std::fs::File::open(file_path).map_err(|source| CohortError::FileRead {
            path: file_path.clone(),
            source,
        })?;
        let (transactions, file_report) = read_transactions(std::io::BufReader::new(file))?;

        debug!(
            "File {}: {} rows read, {} skipped",
            file_path.display(),
            file_report.rows_read,
            file_report.rows_skipped,
        );
        if file_report.rows_skipped > 0 {
            warn!(
                "{} undecodable rows skipped in {}",
                file_report.rows_skipped,
                file_path.display()
            );
        }

        all.extend(transactions);
        report.merge(file_report);
    }

    Ok((all, report))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str =
        "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country";

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    // ── read_transactions ─────────────────────────────────────────────────────

    #[test]
    fn test_read_transactions_basic_row() {
        let data = format!(
            "{HEADER}\n536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,12/1/2010 8:26,2.55,17850.0,United Kingdom\n"
        );
        let (txns, report) = read_transactions(data.as_bytes()).unwrap();

        assert_eq!(report.rows_read, 1);
        assert_eq!(report.rows_skipped, 0);
        assert_eq!(txns.len(), 1);
        let t = &txns[0];
        assert_eq!(t.invoice_no, "536365");
        assert_eq!(t.stock_code, "85123A");
        assert_eq!(t.quantity, 6);
        assert_eq!(t.invoice_date.month(), 12);
        assert!((t.unit_price - 2.55).abs() < 1e-9);
        assert_eq!(t.customer_id.as_ref().unwrap().as_str(), "17850");
        assert_eq!(t.country, "United Kingdom");
    }

    #[test]
    fn test_read_transactions_empty_customer_is_none() {
        let data = format!("{HEADER}\n536414,22139,,56,2010-12-01 11:52:00,0,,United Kingdom\n");
        let (txns, _) = read_transactions(data.as_bytes()).unwrap();
        assert_eq!(txns.len(), 1);
        assert!(txns[0].customer_id.is_none());
        assert_eq!(txns[0].description, "");
    }

    #[test]
    fn test_read_transactions_negative_quantity_kept_raw() {
        let data =
            format!("{HEADER}\nC536379,D,Discount,-1,2010-12-01 09:41:00,27.5,14527,United Kingdom\n");
        let (txns, _) = read_transactions(data.as_bytes()).unwrap();
        assert_eq!(txns[0].quantity, -1);
    }

    #[test]
    fn test_read_transactions_skips_bad_rows() {
        let data = format!(
            "{HEADER}\n\
             1,A,x,not-a-number,2010-12-01 08:00:00,1.0,1,UK\n\
             2,B,y,3,sometime,1.0,1,UK\n\
             3,C,z,4,2010-12-02 08:00:00,1.0,2,UK\n"
        );
        let (txns, report) = read_transactions(data.as_bytes()).unwrap();
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_skipped, 2);
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].invoice_no, "3");
    }

    #[test]
    fn test_read_transactions_online_retail_ii_headers() {
        let data = "Invoice,StockCode,Description,Quantity,InvoiceDate,Price,Customer ID,Country\n\
                    489434,85048,LED BOX,12,2009-12-01 07:45:00,6.95,13085,United Kingdom\n";
        let (txns, _) = read_transactions(data.as_bytes()).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].invoice_no, "489434");
        assert_eq!(txns[0].customer_id.as_ref().unwrap().as_str(), "13085");
    }

    #[test]
    fn test_read_transactions_latin1_description() {
        let mut data = format!("{HEADER}\n1,A,").into_bytes();
        data.extend_from_slice(b"CAF\xC9 MUG");
        data.extend_from_slice(b",2,2011-01-05 10:00:00,1.5,7,France\n");

        let (txns, report) = read_transactions(data.as_slice()).unwrap();
        assert_eq!(report.rows_skipped, 0);
        assert_eq!(txns.len(), 1);
        assert!(txns[0].description.starts_with("CAF"));
    }

    // ── find_csv_files ────────────────────────────────────────────────────────

    #[test]
    fn test_find_csv_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("2011");
        std::fs::create_dir_all(&sub).unwrap();
        write_csv(dir.path(), "b.csv", &[HEADER]);
        write_csv(dir.path(), "a.csv", &[HEADER]);
        write_csv(&sub, "c.CSV", &[HEADER]);
        write_csv(dir.path(), "notes.txt", &["ignore me"]);

        let files = find_csv_files(dir.path());
        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("2011/c.CSV"));
        assert!(files[1].ends_with("a.csv"));
        assert!(files[2].ends_with("b.csv"));
    }

    #[test]
    fn test_find_csv_files_nonexistent_path() {
        let files = find_csv_files(Path::new("/tmp/does-not-exist-cohort-test-xyz"));
        assert!(files.is_empty());
    }

    // ── load_transactions ─────────────────────────────────────────────────────

    #[test]
    fn test_load_transactions_single_file() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "retail.csv",
            &[
                HEADER,
                "1,A,x,5,2010-12-01 08:00:00,1.0,C1,UK",
                "2,B,y,3,2011-01-03 08:00:00,1.0,C1,UK",
            ],
        );

        let (txns, report) = load_transactions(&path).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(report.files_read, 1);
        assert_eq!(report.rows_read, 2);
    }

    #[test]
    fn test_load_transactions_directory_merges_reports() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "a.csv", &[HEADER, "1,A,x,5,2010-12-01 08:00:00,1.0,C1,UK"]);
        write_csv(
            dir.path(),
            "b.csv",
            &[HEADER, "2,B,y,3,2011-01-03 08:00:00,1.0,C2,UK", "3,C,z,bad,2011-01-03,1.0,C2,UK"],
        );

        let (txns, report) = load_transactions(dir.path()).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(report.files_read, 2);
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_skipped, 1);
    }

    #[test]
    fn test_load_transactions_missing_path() {
        let err = load_transactions(Path::new("/tmp/does-not-exist-cohort-test-xyz.csv"))
            .unwrap_err();
        assert!(matches!(err, CohortError::InputNotFound(_)));
    }

    #[test]
    fn test_load_transactions_empty_directory() {
        let dir = TempDir::new().unwrap();
        let err = load_transactions(dir.path()).unwrap_err();
        assert!(matches!(err, CohortError::NoDataFiles(_)));
    }
}
