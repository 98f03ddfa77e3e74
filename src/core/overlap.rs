//! Duplicate payment detection.
//!
//! A claim may only start after the last month the user has already paid for.
//! Months are compared through their `year * 100 + month` code.

use crate::core::period::{MonthYear, parse_month_year, period_start};
use crate::errors::{Error, Result};
use chrono::NaiveDateTime;

/// Rejects a claim whose first month is at or before the covered month.
///
/// There is nothing to overlap on a first-ever payment (`covered_through` is `None`),
/// and a billing phrase whose start cannot be parsed is let through: the period
/// validator has already had its say on the phrase.
pub fn check_overlap(
    billing_period: &str,
    covered_through: Option<NaiveDateTime>,
    current_year: i32,
) -> Result<()> {
    let Some(covered_through) = covered_through else {
        return Ok(());
    };

    let claimed_start = period_start(billing_period);
    let Some(start) = parse_month_year(claimed_start, current_year) else {
        return Ok(());
    };

    let covered = MonthYear::of(covered_through);
    if start.code() <= covered.code() {
        return Err(Error::DuplicateClaim {
            covered_through: covered.to_string(),
            claimed_start: claimed_start.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::period::MONTH_ABBREVIATIONS;

    fn covered(year: i32, month: u32) -> Option<NaiveDateTime> {
        MonthYear::new(year, month).unwrap().cycle_end()
    }

    #[test]
    fn test_first_payment_has_no_overlap() {
        assert!(check_overlap("ม.ค. 68", None, 2025).is_ok());
    }

    #[test]
    fn test_later_month_passes() {
        assert!(check_overlap("มี.ค. 68", covered(2025, 2), 2025).is_ok());
        assert!(check_overlap("ม.ค. 69 - ก.พ. 69", covered(2025, 12), 2025).is_ok());
    }

    #[test]
    fn test_same_or_earlier_month_is_duplicate() {
        let err = check_overlap("ม.ค. 68", covered(2025, 2), 2025).unwrap_err();
        match &err {
            Error::DuplicateClaim {
                covered_through,
                claimed_start,
            } => {
                assert_eq!(covered_through, "กุมภาพันธ์ 68");
                assert_eq!(claimed_start, "ม.ค. 68");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.user_message().contains("กุมภาพันธ์"));

        assert!(matches!(
            check_overlap("ก.พ. 68", covered(2025, 2), 2025),
            Err(Error::DuplicateClaim { .. })
        ));
    }

    #[test]
    fn test_partial_overlap_uses_range_start() {
        assert!(matches!(
            check_overlap("ก.พ. 68 - เม.ย. 68", covered(2025, 2), 2025),
            Err(Error::DuplicateClaim { .. })
        ));
        assert!(matches!(
            check_overlap("ก.พ. 68 ถึง เม.ย. 68", covered(2025, 2), 2025),
            Err(Error::DuplicateClaim { .. })
        ));
    }

    #[test]
    fn test_code_comparison_is_exhaustive_over_two_years() {
        let covered_month = MonthYear::new(2025, 6).unwrap();
        for year in [2024, 2025, 2026] {
            for month in 1..=12_u32 {
                let phrase = format!("{} {}", MONTH_ABBREVIATIONS[(month - 1) as usize], year);
                let claimed = MonthYear::new(year, month).unwrap();
                let result = check_overlap(&phrase, covered_month.cycle_end(), 2025);
                assert_eq!(
                    result.is_err(),
                    claimed.code() <= covered_month.code(),
                    "{phrase}"
                );
            }
        }
    }

    #[test]
    fn test_unparseable_start_is_let_through() {
        assert!(check_overlap("whenever", covered(2025, 2), 2025).is_ok());
    }
}
