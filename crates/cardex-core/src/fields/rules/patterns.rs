//! Regex patterns for date recognition.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Numeric day / numeric month / year: 05/08/1990, 5-8-1990, 05 08 1990
    pub static ref DATE_DMY: Regex = Regex::new(
        r"(\d{1,2})(?:\s*[/\-.]\s*|\s+)(\d{1,2})(?:\s*[/\-.]\s*|\s+)(\d{4})"
    ).unwrap();

    // Year / numeric month / numeric day: 1990-08-05
    pub static ref DATE_YMD: Regex = Regex::new(
        r"(\d{4})(?:\s*[/\-.]\s*|\s+)(\d{1,2})(?:\s*[/\-.]\s*|\s+)(\d{1,2})"
    ).unwrap();

    // Day / month name / year: 05-Aug-1990, 5 August 1990, 05Aug1990
    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(
        r"(\d{1,2})(?:\s*[/\-.]\s*|\s*)([A-Za-z]{3,})(?:\s*[/\-.]\s*|\s*)(\d{4})"
    ).unwrap();
}

/// Month number for a (case-insensitive) name, matched on its first three
/// letters.
pub fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
