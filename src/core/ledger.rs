//! Transaction ledger - admin decisions on pending claims.
//!
//! A transaction moves `pending -> completed` or `pending -> rejected` exactly once.
//! Both transitions are compare-and-set writes in the store; a decision that loses
//! a race, or arrives twice, is reported as [`Error::AlreadyFinalized`] and changes
//! nothing. Approval never moves a due date backward: a claim whose months were
//! covered by another approval after it was submitted is refused as a duplicate and
//! stays `pending` for the admin to reject.

use crate::core::due_date::{DueDate, next_due_date};
use crate::core::engine::BillingEngine;
use crate::core::notify::{Clock, NotificationSink};
use crate::core::overlap::check_overlap;
use crate::core::period::{CYCLE_DAY, MonthYear, period_start};
use crate::entities::{TransactionModel, TransactionStatus};
use crate::errors::{ClaimError, Error, Result};
use crate::store::{CreditOutcome, Store};
use chrono::{Datelike, NaiveDateTime};
use tracing::{info, instrument};

/// An approved transaction and the due date it credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    /// Approved transaction
    pub tx_id: String,
    /// Credited user
    pub user_id: String,
    /// New due date and how it was derived
    pub due: DueDate,
}

impl Approval {
    /// Next billing date as shown to people, e.g. `13 เมษายน 68`.
    #[must_use]
    pub fn next_cycle_label(&self) -> String {
        cycle_label(self.due.at)
    }
}

/// Formats a due date as `13 <month name> <2-digit Buddhist year>`.
#[must_use]
pub fn cycle_label(due: NaiveDateTime) -> String {
    format!("{CYCLE_DAY} {}", MonthYear::of(due))
}

impl<S, N, C> BillingEngine<S, N, C>
where
    S: Store,
    N: NotificationSink,
    C: Clock,
{
    /// Approves a pending transaction and credits the owner's due date.
    ///
    /// The due date is projected from the claimed period when it can be read, and
    /// accumulated on the stored due date otherwise. The status change and the due
    /// date write commit together or not at all. A claim starting at or before the
    /// month the user is now covered through fails with [`Error::DuplicateClaim`].
    #[instrument(skip(self))]
    pub async fn approve(&self, tx_id: &str) -> Result<Approval> {
        let transaction = self.pending_transaction(tx_id).await?;
        let now = self.now();

        let user = self
            .store
            .find_user(&transaction.user_id)
            .await?
            .ok_or_else(|| Error::UserNotFound {
                user_id: transaction.user_id.clone(),
            })?;

        // Another claim may have been approved since this one was submitted
        check_overlap(&transaction.billing_period, user.next_due_date, now.year())?;

        let months =
            u32::try_from(transaction.months_count).map_err(|_| ClaimError::InvalidMonthCount {
                value: transaction.months_count.to_string(),
            })?;
        let due = next_due_date(&transaction.billing_period, months, user.next_due_date, now)
            .ok_or_else(|| Error::DueDateOutOfRange {
                tx_id: tx_id.to_string(),
            })?;

        match self
            .store
            .complete_and_credit(tx_id, &user.id, due.at, now)
            .await?
        {
            CreditOutcome::Credited => {}
            CreditOutcome::NotPending => return Err(self.finalized_error(tx_id).await),
            CreditOutcome::AlreadyCovered => {
                return Err(self.covered_error(&transaction).await);
            }
        }

        let approval = Approval {
            tx_id: tx_id.to_string(),
            user_id: user.id,
            due,
        };
        info!(
            user_id = %approval.user_id,
            due = %approval.due.at,
            basis = ?approval.due.basis,
            "transaction approved"
        );

        self.deliver_user(
            &approval.user_id,
            &format!(
                "✅ Payment received, thank you!\nNext billing cycle: {}",
                approval.next_cycle_label()
            ),
        )
        .await;
        Ok(approval)
    }

    /// Rejects a pending transaction. The owner's due date is left untouched.
    #[instrument(skip(self))]
    pub async fn reject(&self, tx_id: &str) -> Result<TransactionModel> {
        let transaction = self.pending_transaction(tx_id).await?;

        if !self
            .store
            .transition_if_pending(tx_id, TransactionStatus::Rejected, self.now())
            .await?
        {
            return Err(self.finalized_error(tx_id).await);
        }
        info!(user_id = %transaction.user_id, "transaction rejected");

        self.deliver_user(
            &transaction.user_id,
            "❌ Your payment claim was rejected. Please contact the admin.",
        )
        .await;

        self.store
            .find_transaction(tx_id)
            .await?
            .ok_or_else(|| Error::TransactionNotFound {
                tx_id: tx_id.to_string(),
            })
    }

    async fn pending_transaction(&self, tx_id: &str) -> Result<TransactionModel> {
        let transaction = self
            .store
            .find_transaction(tx_id)
            .await?
            .ok_or_else(|| Error::TransactionNotFound {
                tx_id: tx_id.to_string(),
            })?;

        if transaction.status.is_terminal() {
            return Err(Error::AlreadyFinalized {
                tx_id: tx_id.to_string(),
                status: transaction.status,
            });
        }
        Ok(transaction)
    }

    /// Error for a credit refused because the stored due date moved past it.
    async fn covered_error(&self, transaction: &TransactionModel) -> Error {
        let covered = match self.store.find_user(&transaction.user_id).await {
            Ok(user) => user.and_then(|user| user.next_due_date),
            Err(e) => return e,
        };
        Error::DuplicateClaim {
            covered_through: covered
                .map(|due| MonthYear::of(due).to_string())
                .unwrap_or_default(),
            claimed_start: period_start(&transaction.billing_period).to_string(),
        }
    }

    /// Error for a compare-and-set that matched no pending row.
    async fn finalized_error(&self, tx_id: &str) -> Error {
        match self.store.find_transaction(tx_id).await {
            Ok(Some(transaction)) => Error::AlreadyFinalized {
                tx_id: tx_id.to_string(),
                status: transaction.status,
            },
            Ok(None) => Error::TransactionNotFound {
                tx_id: tx_id.to_string(),
            },
            Err(e) => e,
        }
    }
}
