//! Display helpers for cohort tables.
//!
//! Everything here is presentation only; the pipeline keeps full precision
//! and structured `(year, month)` keys.

use crate::models::YearMonth;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Round `value` to `decimals` places for display.
///
/// # Examples
///
/// ```
/// use cohort_core::formatting::round_to;
///
/// assert_eq!(round_to(3.14159, 1), 3.1);
/// assert_eq!(round_to(2.25, 0), 2.0);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use cohort_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a scaled epsilon so exact midpoints round away from zero.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let grouped = group_thousands(&(rounded.trunc() as u64).to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!(
            "{:.prec$}",
            rounded - rounded.trunc(),
            prec = decimals as usize
        );
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a fraction (`0.0..=1.0`) as a percentage with one decimal place.
///
/// # Examples
///
/// ```
/// use cohort_core::formatting::format_percent;
///
/// assert_eq!(format_percent(1.0), "100.0%");
/// assert_eq!(format_percent(0.3333), "33.3%");
/// ```
pub fn format_percent(fraction: f64) -> String {
    format!("{}%", format_number(fraction * 100.0, 1))
}

/// Human-readable cohort row label, e.g. `"December 2010"`.
pub fn month_label(ym: YearMonth) -> String {
    let name = ym
        .month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied();
    match name {
        Some(name) => format!("{} {}", name, ym.year),
        None => ym.to_string(),
    }
}

/// Render an optional matrix cell; absent cells become an empty string.
pub fn format_cell(value: Option<f64>, decimals: u32) -> String {
    value
        .map(|v| format_number(v, decimals))
        .unwrap_or_default()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let remainder = s.len() % 3;
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i != 0 && i % 3 == remainder {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── round_to ─────────────────────────────────────────────────────────────

    #[test]
    fn test_round_to_one_decimal() {
        assert_eq!(round_to(2.6666, 1), 2.7);
        assert_eq!(round_to(10.0, 1), 10.0);
    }

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 1), "0.0");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_negative_rounding_to_zero() {
        assert_eq!(format_number(-0.01, 1), "0.0");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.05, 1), "1.1");
    }

    // ── format_percent ───────────────────────────────────────────────────────

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(1.0), "100.0%");
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(0.25), "25.0%");
        assert_eq!(format_percent(2.0 / 3.0), "66.7%");
    }

    // ── month_label ──────────────────────────────────────────────────────────

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(YearMonth::new(2010, 12)), "December 2010");
        assert_eq!(month_label(YearMonth::new(2011, 1)), "January 2011");
    }

    #[test]
    fn test_month_label_out_of_range_falls_back() {
        assert_eq!(month_label(YearMonth::new(2011, 0)), "2011-00");
        assert_eq!(month_label(YearMonth::new(2011, 13)), "2011-13");
    }

    // ── format_cell ──────────────────────────────────────────────────────────

    #[test]
    fn test_format_cell_absent_is_blank() {
        assert_eq!(format_cell(None, 1), "");
        assert_eq!(format_cell(Some(0.0), 0), "0");
        assert_eq!(format_cell(Some(2.55), 1), "2.6");
    }
}
