//! Billing period parsing.
//!
//! Claims name their months with Thai abbreviations (`ม.ค.` … `ธ.ค.`) and years that
//! may be written as a 2-digit Buddhist-era year (`68`), a 4-digit Buddhist-era year
//! (`2568`) or a plain calendar year (`2025`). Everything here is pure: the current
//! year is passed in by the caller so results never depend on the wall clock.

use crate::errors::ClaimError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Month abbreviations in calendar order, matched literally.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "ม.ค.", "ก.พ.", "มี.ค.", "เม.ย.", "พ.ค.", "มิ.ย.", "ก.ค.", "ส.ค.", "ก.ย.", "ต.ค.", "พ.ย.",
    "ธ.ค.",
];

/// Full month names in calendar order, used for display.
pub const MONTH_NAMES: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

/// Buddhist era = calendar year + 543.
pub const BUDDHIST_ERA_OFFSET: i32 = 543;

/// 4-digit years at or above this are Buddhist-era years.
const BUDDHIST_ERA_THRESHOLD: i32 = 2400;

/// Day of month on which every billing cycle closes.
pub const CYCLE_DAY: u32 = 13;

// Patterns are literals; compilation cannot fail.
#[allow(clippy::unwrap_used)]
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{2,4}").unwrap());

#[allow(clippy::unwrap_used)]
static RANGE_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*|\s*ถึง\s*").unwrap());

/// A calendar month, ordered chronologically. The month is always 1-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    year: i32,
    month: u32,
}

impl MonthYear {
    /// Builds a month, rejecting months outside 1-12.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= 12 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Calendar (Gregorian) year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month, 1-12.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Month containing the given instant.
    #[must_use]
    pub fn of(instant: NaiveDateTime) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
        }
    }

    /// Comparable `year * 100 + month` code (`202503` for March 2025).
    #[must_use]
    pub const fn code(self) -> i64 {
        self.year as i64 * 100 + self.month as i64
    }

    /// Months since year zero, so that differences count months.
    #[must_use]
    pub const fn ordinal(self) -> i64 {
        self.year as i64 * 12 + self.month as i64
    }

    /// Moves forward `months`, carrying into following years.
    #[must_use]
    pub fn add_months(self, months: u32) -> Self {
        let total = i64::from(self.month) + i64::from(months);
        let year = i64::from(self.year) + (total - 1).div_euclid(12);
        let month = (total - 1).rem_euclid(12) + 1;
        Self {
            year: i32::try_from(year).unwrap_or(i32::MAX),
            // rem_euclid(12) + 1 is always within 1..=12
            month: u32::try_from(month).unwrap_or(1),
        }
    }

    /// Day 13, 23:59:59 of this month.
    ///
    /// Returns `None` only when the year is outside chrono's supported range.
    #[must_use]
    pub fn cycle_end(self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, CYCLE_DAY)?.and_hms_opt(23, 59, 59)
    }

    /// Full Thai month name.
    #[must_use]
    pub fn month_name(self) -> &'static str {
        (self.month as usize)
            .checked_sub(1)
            .and_then(|index| MONTH_NAMES.get(index))
            .copied()
            .unwrap_or_default()
    }

    /// Two-digit Buddhist-era year, as people write it (`68` for 2025).
    #[must_use]
    pub const fn short_buddhist_year(self) -> i32 {
        (self.year + BUDDHIST_ERA_OFFSET).rem_euclid(100)
    }
}

/// Formats as `กุมภาพันธ์ 68`.
impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}", self.month_name(), self.short_buddhist_year())
    }
}

/// Exact match of a token against the abbreviation vocabulary.
#[must_use]
pub fn month_from_abbreviation(token: &str) -> Option<u32> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|abbr| *abbr == token)
        .and_then(|index| u32::try_from(index + 1).ok())
}

/// First vocabulary entry, in calendar order, that appears anywhere in `text`.
#[must_use]
pub fn find_month(text: &str) -> Option<u32> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|abbr| text.contains(abbr))
        .and_then(|index| u32::try_from(index + 1).ok())
}

/// Number of distinct abbreviations appearing in `text`.
#[must_use]
pub fn count_month_tokens(text: &str) -> usize {
    MONTH_ABBREVIATIONS
        .iter()
        .filter(|abbr| text.contains(*abbr))
        .count()
}

/// Resolves a written year to a calendar year.
///
/// * `< 100` — 2-digit Buddhist era: `68` → 2568 → 2025
/// * `>= 2400` — 4-digit Buddhist era: `2568` → 2025
/// * `1000..2400` — already a calendar year: `2025` → 2025
/// * anything else (3 digits) is not a year
#[must_use]
pub fn canonical_year(raw: u32) -> Option<i32> {
    let raw = i32::try_from(raw).ok()?;
    match raw {
        0..=99 => Some(2500 + raw - BUDDHIST_ERA_OFFSET),
        1000..=2399 => Some(raw),
        _ if raw >= BUDDHIST_ERA_THRESHOLD => Some(raw - BUDDHIST_ERA_OFFSET),
        _ => None,
    }
}

/// Extracts `(month, year)` from a free-text fragment.
///
/// The month is the first vocabulary match; the year is the first run of 2-4 ASCII
/// digits, or `current_year` when the fragment has none. Returns `None` when no
/// month is named or the digit run is not a recognisable year.
#[must_use]
pub fn parse_month_year(text: &str, current_year: i32) -> Option<MonthYear> {
    let month = find_month(text)?;
    let year = match YEAR_RE.find(text) {
        Some(found) => canonical_year(found.as_str().parse().ok()?)?,
        None => current_year,
    };
    MonthYear::new(year, month)
}

/// Whether the phrase uses a dash or `ถึง` ("to") range separator.
#[must_use]
pub fn has_range_separator(phrase: &str) -> bool {
    phrase.contains('-') || phrase.contains("ถึง")
}

/// Splits a range phrase into its start and end fragments.
#[must_use]
pub fn split_range(phrase: &str) -> Option<(&str, &str)> {
    let mut parts = RANGE_SEPARATOR_RE.split(phrase);
    let start = parts.next()?;
    let end = parts.next()?;
    Some((start, end))
}

/// Fragment naming the first month of a billing period.
#[must_use]
pub fn period_start(phrase: &str) -> &str {
    phrase
        .split('-')
        .next()
        .and_then(|head| head.split("ถึง").next())
        .unwrap_or(phrase)
        .trim()
}

/// Inclusive number of months from `start` to `end`.
#[must_use]
pub const fn inclusive_span(start: MonthYear, end: MonthYear) -> i64 {
    end.ordinal() - start.ordinal() + 1
}

/// Checks that a billing phrase agrees with the declared month count.
///
/// A range (`ม.ค. 68 - มี.ค. 68`, `ม.ค. 68 ถึง มี.ค. 68`) whose ends both parse must span
/// exactly `expected` months. Without a parseable range, a multi-month claim that
/// names a single month is ambiguous. Anything else is accepted: this is advisory
/// validation, not full parsing.
pub fn validate_billing_period(
    phrase: &str,
    expected: u32,
    current_year: i32,
) -> Result<(), ClaimError> {
    if has_range_separator(phrase) {
        let bounds = split_range(phrase).and_then(|(start, end)| {
            Some((
                parse_month_year(start, current_year)?,
                parse_month_year(end, current_year)?,
            ))
        });
        if let Some((start, end)) = bounds {
            let counted = inclusive_span(start, end);
            if counted != i64::from(expected) {
                return Err(ClaimError::MonthCountMismatch {
                    declared: expected,
                    counted,
                });
            }
            return Ok(());
        }
    }

    if expected > 1 && count_month_tokens(phrase) == 1 {
        return Err(ClaimError::AmbiguousPeriod { declared: expected });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const NOW_YEAR: i32 = 2026;

    fn my(year: i32, month: u32) -> MonthYear {
        MonthYear::new(year, month).unwrap()
    }

    #[test]
    fn test_canonical_year_across_digit_counts() {
        // 2-digit Buddhist era
        assert_eq!(canonical_year(68), Some(2025));
        assert_eq!(canonical_year(69), Some(2026));
        assert_eq!(canonical_year(0), Some(1957));
        assert_eq!(canonical_year(99), Some(2056));
        // 4-digit Buddhist era
        assert_eq!(canonical_year(2568), Some(2025));
        assert_eq!(canonical_year(2400), Some(1857));
        // Plain calendar year is not shifted again
        assert_eq!(canonical_year(2025), Some(2025));
        assert_eq!(canonical_year(2399), Some(2399));
        assert_eq!(canonical_year(1000), Some(1000));
        // 3 digits is not a year
        assert_eq!(canonical_year(100), None);
        assert_eq!(canonical_year(999), None);
    }

    #[test]
    fn test_every_month_with_two_digit_year() {
        for (index, abbr) in MONTH_ABBREVIATIONS.iter().enumerate() {
            let parsed = parse_month_year(&format!("{abbr} 68"), NOW_YEAR).unwrap();
            assert_eq!(parsed, my(2025, u32::try_from(index + 1).unwrap()));
        }
    }

    #[test]
    fn test_parse_month_year_year_forms() {
        assert_eq!(parse_month_year("มี.ค. 2568", NOW_YEAR), Some(my(2025, 3)));
        assert_eq!(parse_month_year("มี.ค. 2025", NOW_YEAR), Some(my(2025, 3)));
        assert_eq!(parse_month_year("มี.ค.68", NOW_YEAR), Some(my(2025, 3)));
        assert_eq!(parse_month_year("เดือน ธ.ค.", NOW_YEAR), Some(my(NOW_YEAR, 12)));
    }

    #[test]
    fn test_parse_month_year_failures() {
        assert_eq!(parse_month_year("March 2025", NOW_YEAR), None);
        assert_eq!(parse_month_year("", NOW_YEAR), None);
        assert_eq!(parse_month_year("ม.ค. 125", NOW_YEAR), None);
    }

    #[test]
    fn test_thai_digits_are_not_years() {
        // Thai numerals fall back to the current year instead of failing
        assert_eq!(parse_month_year("ม.ค. ๖๘", NOW_YEAR), Some(my(NOW_YEAR, 1)));
    }

    #[test]
    fn test_vocabulary_does_not_cross_match() {
        assert_eq!(find_month("มี.ค. 68"), Some(3));
        assert_eq!(find_month("พ.ค. 68"), Some(5));
        assert_eq!(find_month("ก.พ. 68"), Some(2));
        assert_eq!(count_month_tokens("มี.ค. 68"), 1);
        assert_eq!(count_month_tokens("ม.ค. 68 - มี.ค. 68"), 2);
        assert_eq!(count_month_tokens("ม.ค. 68 ม.ค. 69"), 1);
    }

    #[test]
    fn test_add_months_carries_years() {
        assert_eq!(my(2025, 3).add_months(1), my(2025, 4));
        assert_eq!(my(2025, 12).add_months(1), my(2026, 1));
        assert_eq!(my(2025, 11).add_months(14), my(2027, 1));
        assert_eq!(my(2025, 5).add_months(0), my(2025, 5));
        for month in 1..=12 {
            let start = my(2024, month);
            assert_eq!(start.add_months(12), my(2025, month));
        }
    }

    #[test]
    fn test_month_stays_within_calendar() {
        assert!(MonthYear::new(2025, 0).is_none());
        assert!(MonthYear::new(2025, 13).is_none());
        for months in [0, 1, 11, 12, 13, 1200] {
            let month = my(2025, 12).add_months(months).month();
            assert!((1..=12).contains(&month));
        }
        assert_eq!(my(2025, 7).year(), 2025);
        assert_eq!(my(2025, 7).month_name(), "กรกฎาคม");
        assert_eq!(MonthYear { year: 2025, month: 0 }.month_name(), "");
    }

    #[test]
    fn test_cycle_end_is_day_13() {
        let end = my(2025, 4).cycle_end().unwrap();
        assert_eq!(end.to_string(), "2025-04-13 23:59:59");
    }

    #[test]
    fn test_display_uses_full_name_and_short_buddhist_year() {
        assert_eq!(my(2025, 2).to_string(), "กุมภาพันธ์ 68");
        assert_eq!(my(2043, 1).to_string(), "มกราคม 86");
        assert_eq!(my(2057, 6).to_string(), "มิถุนายน 00");
    }

    #[test]
    fn test_codes_order_chronologically() {
        assert!(my(2025, 3).code() > my(2025, 2).code());
        assert!(my(2025, 1).code() < my(2025, 2).code());
        assert!(my(2026, 1).code() > my(2025, 12).code());
        assert_eq!(my(2025, 3).code(), 202_503);
    }

    #[test]
    fn test_split_range_and_start() {
        assert_eq!(
            split_range("ม.ค. 68 - มี.ค. 68"),
            Some(("ม.ค. 68", "มี.ค. 68"))
        );
        assert_eq!(
            split_range("ธ.ค. 68 ถึง ม.ค. 69"),
            Some(("ธ.ค. 68", "ม.ค. 69"))
        );
        assert_eq!(split_range("ม.ค. 68"), None);
        assert_eq!(period_start("ม.ค. 68 - มี.ค. 68"), "ม.ค. 68");
        assert_eq!(period_start("ธ.ค. 68 ถึง ม.ค. 69"), "ธ.ค. 68");
        assert_eq!(period_start(" มี.ค. 68 "), "มี.ค. 68");
    }

    #[test]
    fn test_range_matching_count_is_accepted() {
        assert!(validate_billing_period("ม.ค. 68 - มี.ค. 68", 3, NOW_YEAR).is_ok());
        assert!(validate_billing_period("ธ.ค. 68 - ม.ค. 69", 2, NOW_YEAR).is_ok());
        assert!(validate_billing_period("ธ.ค. 68 ถึง ม.ค. 69", 2, NOW_YEAR).is_ok());
        assert!(validate_billing_period("ม.ค. 68-ม.ค. 68", 1, NOW_YEAR).is_ok());
    }

    #[test]
    fn test_range_span_accepted_iff_count_matches() {
        let start = my(2025, 1);
        for span in 1..=24_u32 {
            let end = start.add_months(span - 1);
            let phrase = format!(
                "{} {} - {} {}",
                MONTH_ABBREVIATIONS[(start.month - 1) as usize],
                start.year,
                MONTH_ABBREVIATIONS[(end.month - 1) as usize],
                end.year
            );
            for declared in 1..=24_u32 {
                let result = validate_billing_period(&phrase, declared, NOW_YEAR);
                if declared == span {
                    assert!(result.is_ok(), "{phrase} / {declared}");
                } else {
                    assert_eq!(
                        result,
                        Err(ClaimError::MonthCountMismatch {
                            declared,
                            counted: i64::from(span),
                        })
                    );
                }
            }
        }
    }

    #[test]
    fn test_range_mismatch_names_both_numbers() {
        let err = validate_billing_period("ม.ค. 68 - มี.ค. 68", 2, NOW_YEAR).unwrap_err();
        assert_eq!(
            err,
            ClaimError::MonthCountMismatch {
                declared: 2,
                counted: 3
            }
        );
        let message = err.to_string();
        assert!(message.contains("claimed 2"));
        assert!(message.contains("spans 3"));
    }

    #[test]
    fn test_single_month_multi_count_is_ambiguous() {
        assert_eq!(
            validate_billing_period("ม.ค. 68", 2, NOW_YEAR),
            Err(ClaimError::AmbiguousPeriod { declared: 2 })
        );
    }

    #[test]
    fn test_single_month_single_count_is_accepted() {
        assert!(validate_billing_period("ม.ค. 68", 1, NOW_YEAR).is_ok());
        assert!(validate_billing_period("มี.ค.", 1, NOW_YEAR).is_ok());
    }

    #[test]
    fn test_unparseable_range_falls_back_to_token_count() {
        // One end has no month: counted as a single-month phrase
        assert_eq!(
            validate_billing_period("ม.ค. 68 - later", 2, NOW_YEAR),
            Err(ClaimError::AmbiguousPeriod { declared: 2 })
        );
        // Two months named, no parseable range: accepted
        assert!(validate_billing_period("ม.ค. ก.พ. 68", 2, NOW_YEAR).is_ok());
    }
}
