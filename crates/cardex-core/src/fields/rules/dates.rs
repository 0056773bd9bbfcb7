//! Date of birth validation.

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::FieldValidator;
use super::confusion::date_digit_for;
use super::patterns::{DATE_DAY_MONTH_NAME, DATE_DMY, DATE_YMD, month_from_name};

/// Which match wins when several date patterns match the same text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStrategy {
    /// First calendar-valid match in pattern priority order.
    #[default]
    PriorityOrder,
    /// Valid match covering the most text; ties go to priority order.
    LongestMatch,
}

/// Field order of a date pattern's three capture groups.
#[derive(Debug, Clone, Copy)]
enum Layout {
    DayMonthYear,
    YearMonthDay,
    DayMonthNameYear,
}

/// Date validator producing `DD/MM/YYYY`.
pub struct DateValidator {
    strategy: DateStrategy,
    min_year: i32,
    max_year: i32,
}

impl DateValidator {
    /// Create a validator accepting years from 1900 to ten years ahead.
    pub fn new() -> Self {
        Self {
            strategy: DateStrategy::default(),
            min_year: 1900,
            max_year: Local::now().year() + 10,
        }
    }

    /// Set the match selection strategy.
    pub fn with_strategy(mut self, strategy: DateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the accepted year range (inclusive).
    pub fn with_year_range(mut self, min_year: i32, max_year: i32) -> Self {
        self.min_year = min_year;
        self.max_year = max_year;
        self
    }

    /// Build the calendar date for a day/month/year triple if it is in range.
    fn to_date(&self, day: u32, month: u32, year: i32) -> Option<NaiveDate> {
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return None;
        }
        if year < self.min_year || year > self.max_year {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Compact form: exactly eight digits, read as DDMMYYYY then MMDDYYYY.
    fn parse_compact(&self, normalized: &str) -> Option<NaiveDate> {
        let digits: Vec<u32> = normalized
            .chars()
            .filter_map(|c| c.to_digit(10))
            .collect();

        if digits.len() != 8 {
            return None;
        }

        let first = digits[0] * 10 + digits[1];
        let second = digits[2] * 10 + digits[3];
        let year = digits[4..].iter().fold(0u32, |acc, d| acc * 10 + d) as i32;

        self.to_date(first, second, year)
            .or_else(|| self.to_date(second, first, year))
    }

    /// All calendar-valid pattern matches, in priority order, with the
    /// length of the matched text.
    fn pattern_matches(&self, normalized: &str) -> Vec<(NaiveDate, usize)> {
        let patterns: [(&Regex, Layout); 3] = [
            (&DATE_DMY, Layout::DayMonthYear),
            (&DATE_YMD, Layout::YearMonthDay),
            (&DATE_DAY_MONTH_NAME, Layout::DayMonthNameYear),
        ];

        let mut matches = Vec::new();
        for (pattern, layout) in patterns {
            for caps in pattern.captures_iter(normalized) {
                let (day, month, year) = match layout {
                    Layout::DayMonthYear => (
                        caps[1].parse::<u32>().ok(),
                        caps[2].parse::<u32>().ok(),
                        caps[3].parse::<i32>().ok(),
                    ),
                    Layout::YearMonthDay => (
                        caps[3].parse::<u32>().ok(),
                        caps[2].parse::<u32>().ok(),
                        caps[1].parse::<i32>().ok(),
                    ),
                    Layout::DayMonthNameYear => (
                        caps[1].parse::<u32>().ok(),
                        month_from_name(&caps[2]),
                        caps[3].parse::<i32>().ok(),
                    ),
                };

                let (Some(day), Some(month), Some(year)) = (day, month, year) else {
                    continue;
                };

                if let Some(date) = self.to_date(day, month, year) {
                    let span = caps.get(0).map(|m| m.as_str().len()).unwrap_or(0);
                    matches.push((date, span));
                }
            }
        }
        matches
    }

    /// Parse raw text into a calendar date.
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        let normalized = normalize_date_text(text);

        if let Some(date) = self.parse_compact(&normalized) {
            return Some(date);
        }

        let matches = self.pattern_matches(&normalized);
        match self.strategy {
            DateStrategy::PriorityOrder => matches.first().map(|(date, _)| *date),
            DateStrategy::LongestMatch => {
                let mut best: Option<(NaiveDate, usize)> = None;
                for (date, span) in matches {
                    if best.is_none_or(|(_, best_span)| span > best_span) {
                        best = Some((date, span));
                    }
                }
                best.map(|(date, _)| date)
            }
        }
    }
}

impl Default for DateValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldValidator for DateValidator {
    fn validate(&self, text: &str) -> String {
        self.parse(text)
            .map(|date| date.format("%d/%m/%Y").to_string())
            .unwrap_or_default()
    }
}

/// Replace digit look-alikes and drop characters that cannot be part of a
/// date.
///
/// Letter runs of one or two confusable glyphs are replaced when they sit in
/// a numeric context: inside a token that already holds a digit ("O5"), or
/// as a token of their own next to a numeric token ("Ol/O5/1990"). Month
/// names are never short enough to qualify.
fn normalize_date_text(text: &str) -> String {
    let mut pieces: Vec<Piece> = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_alphanumeric() {
            let mut token = vec![c];
            while let Some(&next) = chars.peek() {
                if !next.is_alphanumeric() {
                    break;
                }
                token.push(next);
                chars.next();
            }
            pieces.push(Piece::Token(token));
        } else if c.is_whitespace() {
            pieces.push(Piece::Separator(' '));
        } else if matches!(c, '/' | '-' | '.') {
            pieces.push(Piece::Separator(c));
        }
    }

    let tokens: Vec<&[char]> = pieces
        .iter()
        .filter_map(|piece| match piece {
            Piece::Token(token) => Some(token.as_slice()),
            Piece::Separator(_) => None,
        })
        .collect();

    let mut numeric: Vec<bool> = tokens
        .iter()
        .map(|token| token.iter().any(char::is_ascii_digit))
        .collect();
    // Spread numeric context to neighbouring glyph-only tokens until stable.
    loop {
        let mut changed = false;
        for i in 0..tokens.len() {
            if numeric[i] || !is_glyph_run(tokens[i]) {
                continue;
            }
            let left = i > 0 && numeric[i - 1];
            let right = i + 1 < tokens.len() && numeric[i + 1];
            if left || right {
                numeric[i] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut index = 0;
    for piece in &pieces {
        match piece {
            Piece::Separator(c) => out.push(*c),
            Piece::Token(token) => {
                push_token(token, numeric[index], &mut out);
                index += 1;
            }
        }
    }
    out
}

enum Piece {
    Token(Vec<char>),
    Separator(char),
}

/// One or two letters, all of them digit look-alikes.
fn is_glyph_run(run: &[char]) -> bool {
    !run.is_empty()
        && run.len() <= 2
        && run.iter().all(|&c| c.is_alphabetic() && date_digit_for(c).is_some())
}

fn push_token(token: &[char], numeric: bool, out: &mut String) {
    let mut j = 0;
    while j < token.len() {
        let c = token[j];
        if !c.is_alphabetic() {
            if c.is_ascii_digit() {
                out.push(c);
            }
            j += 1;
            continue;
        }

        let start = j;
        while j < token.len() && token[j].is_alphabetic() {
            j += 1;
        }
        let run = &token[start..j];
        let substitute = numeric && is_glyph_run(run);

        for &c in run {
            match date_digit_for(c) {
                Some(digit) if substitute => out.push(digit),
                _ => out.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn validator() -> DateValidator {
        DateValidator::new().with_year_range(1900, 2036)
    }

    #[test]
    fn test_day_month_year() {
        let v = validator();
        assert_eq!(v.validate("05/08/1990"), "05/08/1990");
        assert_eq!(v.validate("5-8-1990"), "05/08/1990");
        assert_eq!(v.validate("5.8.1990"), "05/08/1990");
    }

    #[test]
    fn test_compact_digits() {
        let v = validator();
        assert_eq!(v.validate("05081990"), "05/08/1990");
        // Month 13 is impossible, so it is read month-first.
        assert_eq!(v.validate("02131990"), "13/02/1990");
    }

    #[test]
    fn test_year_first() {
        assert_eq!(validator().validate("1990-08-05"), "05/08/1990");
        assert_eq!(validator().validate("1990/8/5"), "05/08/1990");
    }

    #[test]
    fn test_month_names() {
        let v = validator();
        assert_eq!(v.validate("12 Nov 1990"), "12/11/1990");
        assert_eq!(v.validate("3-january-2001"), "03/01/2001");
        assert_eq!(v.validate("12Jul1990"), "12/07/1990");
        assert_eq!(v.validate("12 Foo 1990"), "");
    }

    #[test]
    fn test_ocr_glyphs_are_corrected() {
        let v = validator();
        assert_eq!(v.validate("O1/O2/199O"), "01/02/1990");
        assert_eq!(v.validate("l2/O5/l990"), "12/05/1990");
        assert_eq!(v.validate("DOB: 1S/08/1985"), "15/08/1985");
    }

    #[test]
    fn test_glyph_only_day_or_month() {
        let v = validator();
        assert_eq!(v.validate("Ol/O5/1990"), "01/05/1990");
        assert_eq!(v.validate("OI/12/1990"), "01/12/1990");
        assert_eq!(v.validate("lO-O5-1990"), "10/05/1990");
        assert_eq!(v.validate("OI/OI/1990"), "01/01/1990");
    }

    #[test]
    fn test_glyph_tokens_need_numeric_neighbour() {
        let v = validator();
        // "Oct" is too long to be read as digits.
        assert_eq!(v.validate("O5 Oct 1990"), "05/10/1990");
        // Lone glyph pairs with no digits around stay letters.
        assert_eq!(normalize_date_text("IO SO"), "IO SO");
    }

    #[test]
    fn test_impossible_dates_rejected() {
        let v = validator();
        assert_eq!(v.validate("31/02/2020"), "");
        assert_eq!(v.validate("29/02/2021"), "");
        assert_eq!(v.validate("29/02/2020"), "29/02/2020");
        assert_eq!(v.validate("00/01/1990"), "");
    }

    #[test]
    fn test_year_range() {
        let v = validator();
        assert_eq!(v.validate("01/01/1899"), "");
        assert_eq!(v.validate("01/01/2036"), "01/01/2036");
        assert_eq!(v.validate("01/01/2037"), "");
    }

    #[test]
    fn test_garbage_yields_empty() {
        let v = validator();
        assert_eq!(v.validate(""), "");
        assert_eq!(v.validate("@@##!!"), "");
        assert_eq!(v.validate("INCOME TAX DEPARTMENT"), "");
        assert_eq!(v.validate("\u{0}\u{ffff}日本語 12"), "");
    }

    #[test]
    fn test_strategies_disagree() {
        // "1 1 2000" is the first pattern match, "12 Jan 2000" covers more text.
        let text = "1 1 2000 / 12 Jan 2000";

        let priority = validator();
        assert_eq!(priority.validate(text), "01/01/2000");

        let longest = validator().with_strategy(DateStrategy::LongestMatch);
        assert_eq!(longest.validate(text), "12/01/2000");
    }

    #[test]
    fn test_output_is_always_well_formed() {
        let v = validator();
        let inputs = [
            "31/04/1990", "1990", "12/12/12", "99/99/9999", "O0/OO/OOOO",
            "15 Aug 1947", "2000-02-30", "7 7 1977", "  ", "1/1/1900 2/2/2000",
        ];

        for input in inputs {
            let out = v.validate(input);
            if out.is_empty() {
                continue;
            }
            let date = NaiveDate::parse_from_str(&out, "%d/%m/%Y").unwrap();
            assert_eq!(out.len(), 10);
            assert!((1900..=2036).contains(&date.year()));
        }
    }
}
