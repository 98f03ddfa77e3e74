//! Next due date calculation.
//!
//! Billing cycles close on day 13 at 23:59:59. An approved claim is projected from
//! the month it says it starts at; when that month cannot be read, the months are
//! accumulated on top of the user's stored due date instead.

use crate::core::period::{CYCLE_DAY, MonthYear, parse_month_year, period_start};
use chrono::{Datelike, NaiveDateTime};

/// How a due date was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDateBasis {
    /// Projected from the claim's own start month
    ClaimedPeriod(MonthYear),
    /// Added on top of the stored due date, or now
    Accumulated(MonthYear),
}

/// A computed due date and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueDate {
    /// Day 13, 23:59:59 of the resulting month
    pub at: NaiveDateTime,
    /// Base month the months were added to
    pub basis: DueDateBasis,
}

/// Claim projection: `months` after the claimed start month.
#[must_use]
pub fn project_from_claim(start: MonthYear, months: u32) -> Option<NaiveDateTime> {
    start.add_months(months).cycle_end()
}

/// Base month for accumulation.
///
/// A due date still in the future is extended. Otherwise counting starts from the
/// current month, or the next one once this month's cycle day has passed, so the
/// result never lands in the past.
#[must_use]
pub fn accumulation_base(current_due: Option<NaiveDateTime>, now: NaiveDateTime) -> MonthYear {
    match current_due {
        Some(due) if due > now => MonthYear::of(due),
        _ if now.day() > CYCLE_DAY => MonthYear::of(now).add_months(1),
        _ => MonthYear::of(now),
    }
}

/// Accumulation: `months` after [`accumulation_base`].
#[must_use]
pub fn accumulate(
    current_due: Option<NaiveDateTime>,
    months: u32,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    accumulation_base(current_due, now).add_months(months).cycle_end()
}

/// Due date for an approved claim.
///
/// Claim projection is preferred whenever the billing phrase names a start month;
/// accumulation from the stored due date is the fallback. Returns `None` only if
/// the result would fall outside the supported calendar range.
#[must_use]
pub fn next_due_date(
    billing_period: &str,
    months: u32,
    current_due: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Option<DueDate> {
    if let Some(start) = parse_month_year(period_start(billing_period), now.year()) {
        return Some(DueDate {
            at: project_from_claim(start, months)?,
            basis: DueDateBasis::ClaimedPeriod(start),
        });
    }

    let base = accumulation_base(current_due, now);
    Some(DueDate {
        at: base.add_months(months).cycle_end()?,
        basis: DueDateBasis::Accumulated(base),
    })
}
