//! Cycle reminders and the overdue report.
//!
//! Scheduling is left to the caller; these only build the text.

use crate::core::engine::BillingEngine;
use crate::core::notify::{Clock, NotificationSink};
use crate::core::period::{CYCLE_DAY, MonthYear};
use crate::entities::UserModel;
use crate::errors::Result;
use crate::store::Store;
use chrono::NaiveDateTime;

/// Day-13 reminder for the cycle containing `now`.
#[must_use]
pub fn monthly_reminder_text(now: NaiveDateTime, monthly_price: f64) -> String {
    format!(
        "📢 Reminder: the {} cycle closes on the {CYCLE_DAY}th. \
         Please transfer {monthly_price:.2} per month and send your slip!",
        MonthYear::of(now)
    )
}

/// Users whose covered period has ended. Users who never paid are not listed.
#[must_use]
pub fn overdue_users(users: &[UserModel], now: NaiveDateTime) -> Vec<&UserModel> {
    users
        .iter()
        .filter(|user| user.next_due_date.is_some_and(|due| due < now))
        .collect()
}

/// Overdue report, or `None` when everyone is up to date.
#[must_use]
pub fn overdue_report(users: &[UserModel], now: NaiveDateTime) -> Option<String> {
    let overdue = overdue_users(users, now);
    if overdue.is_empty() {
        return None;
    }

    let lines: Vec<String> = overdue
        .iter()
        .filter_map(|user| {
            let due = user.next_due_date?;
            Some(format!(
                "- {} ({}): paid through {}",
                user.first_name,
                user.nickname,
                MonthYear::of(due)
            ))
        })
        .collect();
    Some(format!("⚠️ Outstanding payments:\n{}", lines.join("\n")))
}

impl<S, N, C> BillingEngine<S, N, C>
where
    S: Store,
    N: NotificationSink,
    C: Clock,
{
    /// Reminder text for the current cycle.
    #[must_use]
    pub fn monthly_reminder(&self) -> String {
        monthly_reminder_text(self.now(), self.settings().monthly_price)
    }

    /// Overdue report across all registered users.
    pub async fn overdue_report(&self) -> Result<Option<String>> {
        let users = self.store().list_users().await?;
        Ok(overdue_report(&users, self.now()))
    }
}
