//! Display formatting for report output (en-US conventions).

use crate::metrics::TrendDirection;
use serde::{Deserialize, Serialize};

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Fixed decimals with thousands separators; the sign is returned separately.
fn split_fixed(value: f64, decimals: usize) -> (bool, String) {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = group_thousands(int_part);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }

    // Avoid "-0" once rounding has eaten every significant digit.
    let negative = value < 0.0 && out.chars().any(|c| c.is_ascii_digit() && c != '0');
    (negative, out)
}

pub fn format_number(value: f64, decimals: usize) -> String {
    let (negative, body) = split_fixed(value, decimals);
    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

/// Whole dollars, e.g. `-$1,234`.
pub fn format_currency(value: f64) -> String {
    let (negative, body) = split_fixed(value, 0);
    if negative {
        format!("-${}", body)
    } else {
        format!("${}", body)
    }
}

/// `value` is already a percentage: `12.345` -> `"12.3%"`.
pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{}%", format_number(value, decimals))
}

pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeIndicator {
    pub text: String,
    pub direction: TrendDirection,
}

/// Signed one-decimal change label. Moves under 0.1% read as no change.
pub fn format_change(percentage: f64) -> ChangeIndicator {
    let abs = percentage.abs();

    if abs < 0.1 || !percentage.is_finite() {
        return ChangeIndicator {
            text: "0.0%".to_string(),
            direction: TrendDirection::Flat,
        };
    }

    if percentage > 0.0 {
        ChangeIndicator {
            text: format!("+{:.1}%", abs),
            direction: TrendDirection::Up,
        }
    } else {
        ChangeIndicator {
            text: format!("-{:.1}%", abs),
            direction: TrendDirection::Down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1_234_567.4), "$1,234,567");
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(-25_000.0), "-$25,000");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(-0.2), "$0");
    }

    #[test]
    fn test_format_percentage_and_number() {
        assert_eq!(format_percentage(40.0, 1), "40.0%");
        assert_eq!(format_percentage(12.346, 2), "12.35%");
        assert_eq!(format_percentage(-3.21, 1), "-3.2%");
        assert_eq!(format_number(1_234.5678, 2), "1,234.57");
        assert_eq!(format_number(1_000_000.0, 0), "1,000,000");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(1_260_000.0), "1.3M");
        assert_eq!(format_compact(-850_000.0), "-850.0K");
        assert_eq!(format_compact(2_000_000_000.0), "2.0B");
        assert_eq!(format_compact(999.0), "999");
    }

    #[test]
    fn test_format_change() {
        let up = format_change(12.34);
        assert_eq!(up.text, "+12.3%");
        assert_eq!(up.direction, TrendDirection::Up);

        let down = format_change(-5.0);
        assert_eq!(down.text, "-5.0%");
        assert_eq!(down.direction, TrendDirection::Down);

        let flat = format_change(0.05);
        assert_eq!(flat.text, "0.0%");
        assert_eq!(flat.direction, TrendDirection::Flat);
        assert_eq!(format_change(-0.09).text, "0.0%");
    }
}
