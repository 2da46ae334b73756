//! EDTF date validation
//!
//! Supported subset of Extended Date/Time Format (levels 0 and 1):
//!
//! - `YYYY`, `YYYY-MM`, `YYYY-MM-DD` with real calendar values
//! - seasons `YYYY-21` through `YYYY-41`
//! - unspecified digits: `YYYX`, `YYXX`, `YYYY-XX`, `YYYY-MM-XX`, `YYYY-XX-XX`
//! - one trailing qualifier: `?` uncertain, `~` approximate, `%` both
//! - intervals `A/B`, where either end may be open (`..` or empty)

use chrono::NaiveDate;

/// True if `value` is a date or interval in the supported subset
pub fn validate_edtf(value: &str) -> bool {
    if value.contains('/') {
        return validate_interval(value);
    }
    validate_date(value)
}

fn validate_interval(value: &str) -> bool {
    let mut ends = value.split('/');
    let (Some(start), Some(end), None) = (ends.next(), ends.next(), ends.next()) else {
        return false;
    };
    let start_open = is_open_end(start);
    let end_open = is_open_end(end);
    if start_open && end_open {
        return false;
    }
    (start_open || validate_date(start)) && (end_open || validate_date(end))
}

fn is_open_end(end: &str) -> bool {
    end.is_empty() || end == ".."
}

fn validate_date(value: &str) -> bool {
    let value = value.strip_suffix(['?', '~', '%']).unwrap_or(value);
    let parts: Vec<&str> = value.split('-').collect();
    match parts.as_slice() {
        [year] => valid_year(year, true),
        [year, month] => valid_year(year, false) && valid_month_or_season(month),
        [year, month, day] => valid_year(year, false) && valid_day(year, month, day),
        _ => false,
    }
}

/// Four characters: digits, or with `X` placeholders for the last one or
/// two digits when the year stands alone
fn valid_year(year: &str, allow_unspecified: bool) -> bool {
    if year.len() != 4 || !year.is_ascii() {
        return false;
    }
    if year.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    if !allow_unspecified {
        return false;
    }
    let (digits, placeholders) = year.split_at(year.trim_end_matches('X').len());
    matches!(placeholders.len(), 1 | 2) && digits.bytes().all(|b| b.is_ascii_digit())
}

fn two_digits(part: &str) -> Option<u32> {
    if part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit()) {
        part.parse().ok()
    } else {
        None
    }
}

fn valid_month_or_season(month: &str) -> bool {
    if month == "XX" {
        return true;
    }
    matches!(two_digits(month), Some(1..=12) | Some(21..=41))
}

fn valid_day(year: &str, month: &str, day: &str) -> bool {
    if month == "XX" {
        return day == "XX";
    }
    let Some(month) = two_digits(month).filter(|m| (1..=12).contains(m)) else {
        return false;
    };
    if day == "XX" {
        return true;
    }
    let (Ok(year), Some(day)) = (year.parse::<i32>(), two_digits(day)) else {
        return false;
    };
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}
