//! Billing engine - the service every inbound event goes through.
//!
//! [`BillingEngine`] owns its collaborators explicitly: a [`Store`] for persistence, a
//! [`NotificationSink`] for outbound messages and a [`Clock`] for time. It is
//! framework-agnostic; the Discord layer only translates commands into calls here.
//! Approval and rejection live in [`crate::core::ledger`].

use crate::config::settings::BillingSettings;
use crate::core::claim::{Claim, ClaimParser};
use crate::core::notify::{Clock, NotificationSink, SlipAttachment};
use crate::core::overlap::check_overlap;
use crate::core::period::MonthYear;
use crate::entities::{TransactionModel, UserModel, user::nickname_key};
use crate::errors::{Error, Result};
use crate::store::{NewRegistration, NewTransaction, Store};
use chrono::{Datelike, NaiveDateTime};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Where a user stands relative to their due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// No payment has ever been approved
    NoHistory,
    /// Covered through the given cycle
    PaidThrough(MonthYear),
    /// The last covered cycle has closed
    Overdue(MonthYear),
}

impl PaymentStatus {
    /// Status at `now` for a stored due date.
    #[must_use]
    pub fn at(next_due_date: Option<NaiveDateTime>, now: NaiveDateTime) -> Self {
        match next_due_date {
            None => Self::NoHistory,
            Some(due) if due > now => Self::PaidThrough(MonthYear::of(due)),
            Some(due) => Self::Overdue(MonthYear::of(due)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHistory => f.write_str("No payment history yet. Start with your first cycle!"),
            Self::PaidThrough(cycle) => write!(f, "✅ Status: up to date (paid through {cycle})"),
            Self::Overdue(cycle) => write!(f, "❌ Overdue! Last paid cycle: {cycle}"),
        }
    }
}

/// Result of an admin nickname lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSummary {
    /// The registered user
    pub user: UserModel,
    /// Standing at lookup time
    pub status: PaymentStatus,
}

impl fmt::Display for MemberSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})\n📞 {}\n📧 {}\n{}",
            self.user.first_name,
            self.user.last_name,
            self.user.nickname,
            self.user.tel_number,
            self.user.email,
            self.status
        )
    }
}

/// Billing-cycle reconciliation service.
pub struct BillingEngine<S, N, C> {
    pub(crate) store: S,
    pub(crate) notifier: N,
    clock: C,
    settings: BillingSettings,
}

impl<S, N, C> BillingEngine<S, N, C>
where
    S: Store,
    N: NotificationSink,
    C: Clock,
{
    /// Assembles an engine from its collaborators.
    #[must_use]
    pub const fn new(store: S, notifier: N, clock: C, settings: BillingSettings) -> Self {
        Self {
            store,
            notifier,
            clock,
            settings,
        }
    }

    /// Persistence backend.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Active billing settings.
    #[must_use]
    pub const fn settings(&self) -> &BillingSettings {
        &self.settings
    }

    /// Current time in the billing time zone.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Registers a user, or updates the contact details of an existing registration.
    ///
    /// Nicknames are unique ignoring case; a user may keep their own nickname.
    #[instrument(skip(self, registration), fields(user_id = %registration.user_id))]
    pub async fn register(&self, registration: NewRegistration) -> Result<UserModel> {
        let registration = normalize_registration(registration)?;

        if let Some(holder) = self.store.find_by_nickname(&registration.nickname).await? {
            if holder.id != registration.user_id {
                debug!(nickname = %registration.nickname, "nickname taken");
                return Err(Error::NicknameTaken {
                    nickname: registration.nickname,
                });
            }
        }

        let user = self
            .store
            .upsert_registration(&registration, self.now())
            .await?;
        info!(nickname = %user.nickname, "user registered");
        Ok(user)
    }

    /// Loads a registered user or fails with [`Error::NotRegistered`].
    pub async fn require_user(&self, user_id: &str) -> Result<UserModel> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(Error::NotRegistered)
    }

    /// Stores a proof-of-payment image as the user's pending slip.
    ///
    /// A previous, unconsumed slip is replaced and its image deleted. The pointer is
    /// swapped only from the value last read, so a slip that a concurrent claim or
    /// sweep consumed in the meantime is never deleted here.
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn attach_slip(&self, user_id: &str, filename: &str, data: Vec<u8>) -> Result<i64> {
        let mut user = self.require_user(user_id).await?;
        let now = self.now();

        let slip_id = self.store.save_slip(filename, data, now).await?;
        loop {
            let previous = user.pending_slip_id;
            if self
                .store
                .set_pending_slip_ref(user_id, previous, slip_id, now)
                .await?
            {
                if let Some(previous) = previous {
                    self.store.delete_slip(previous).await?;
                    debug!(previous, "replaced pending slip");
                }
                break;
            }
            debug!(?previous, "pending slip moved concurrently, retrying");
            user = self.require_user(user_id).await?;
        }

        info!(slip_id, "slip received");
        Ok(slip_id)
    }

    /// Validates a claim and records it as a `pending` transaction.
    ///
    /// Checks run in order: registration, claim format, nickname, overlap with the
    /// covered period, then the pending slip. Nothing is written unless all pass. On
    /// success the slip is consumed and the administrator is notified.
    #[instrument(skip(self, text))]
    pub async fn submit_claim(&self, user_id: &str, text: &str) -> Result<TransactionModel> {
        let user = self.require_user(user_id).await?;
        let now = self.now();

        let claim = ClaimParser::new(&self.settings.banks, now.year()).parse(text)?;

        if nickname_key(&claim.nickname) != user.nickname_key {
            return Err(Error::NicknameMismatch);
        }

        check_overlap(&claim.billing_period, user.next_due_date, now.year())?;

        let slip_id = user.pending_slip_id.ok_or(Error::NoPendingSlip)?;
        // The sweep may have removed the image after the user row was read.
        let slip = self
            .store
            .find_slip(slip_id)
            .await?
            .ok_or(Error::NoPendingSlip)?;

        // Recorded only if the pointer still holds this slip
        let Some(transaction) = self
            .store
            .record_claim(new_transaction(&user, &claim, slip_id), now)
            .await?
        else {
            debug!(slip_id, "pending slip replaced or swept before the claim was recorded");
            return Err(Error::NoPendingSlip);
        };
        info!(tx_id = %transaction.id, months = claim.months, "claim recorded");

        let attachment = SlipAttachment {
            filename: slip.filename,
            data: slip.data,
        };
        self.deliver_admin(&admin_claim_message(&user, &claim, &transaction.id), &[attachment])
            .await;

        Ok(transaction)
    }

    /// The caller's own payment standing.
    pub async fn payment_status(&self, user_id: &str) -> Result<PaymentStatus> {
        let user = self.require_user(user_id).await?;
        Ok(PaymentStatus::at(user.next_due_date, self.now()))
    }

    /// Administrator lookup of a member by nickname, ignoring case.
    pub async fn lookup_nickname(&self, nickname: &str) -> Result<MemberSummary> {
        let user = self
            .store
            .find_by_nickname(nickname)
            .await?
            .ok_or_else(|| Error::UserNotFound {
                user_id: nickname.trim().to_string(),
            })?;
        let status = PaymentStatus::at(user.next_due_date, self.now());
        Ok(MemberSummary { user, status })
    }

    /// Discards pending slips older than the configured timeout.
    ///
    /// Returns how many were removed. A slip replaced or claimed after the expired
    /// list was read is left alone. A claim arriving afterwards fails with
    /// [`Error::NoPendingSlip`].
    #[instrument(skip(self))]
    pub async fn sweep_expired_slips(&self) -> Result<usize> {
        let cutoff = self.now() - self.settings.slip_timeout();
        let expired = self.store.users_with_slips_before(cutoff).await?;

        let mut swept = 0;
        for user in &expired {
            let Some(slip_id) = user.pending_slip_id else {
                continue;
            };
            if self.store.clear_pending_slip_ref(&user.id, slip_id).await? {
                self.store.delete_slip(slip_id).await?;
                swept += 1;
                debug!(user_id = %user.id, slip_id, "expired slip discarded");
            }
        }

        if swept > 0 {
            info!(count = swept, "swept expired slips");
        }
        Ok(swept)
    }

    /// Sends a direct message, logging instead of failing.
    pub(crate) async fn deliver_user(&self, user_id: &str, message: &str) {
        if let Err(e) = self.notifier.notify_user(user_id, message).await {
            warn!(user_id, error = %e, "failed to notify user");
        }
    }

    /// Notifies the administrator, logging instead of failing.
    pub(crate) async fn deliver_admin(&self, message: &str, attachments: &[SlipAttachment]) {
        if let Err(e) = self.notifier.notify_admin(message, attachments).await {
            warn!(error = %e, "failed to notify admin");
        }
    }
}

fn normalize_registration(registration: NewRegistration) -> Result<NewRegistration> {
    let NewRegistration {
        user_id,
        first_name,
        last_name,
        nickname,
        tel_number,
        email,
    } = registration;

    let fields = [
        ("first name", first_name.trim()),
        ("last name", last_name.trim()),
        ("nickname", nickname.trim()),
        ("phone number", tel_number.trim()),
        ("email", email.trim()),
    ];
    if let Some((field, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
        return Err(Error::InvalidRegistration {
            message: format!("Missing {field}"),
        });
    }

    // The inline claim layout reads the nickname as the first token.
    if nickname.trim().contains(char::is_whitespace) {
        return Err(Error::InvalidRegistration {
            message: "Nickname must be a single word".to_string(),
        });
    }
    if !email.contains('@') {
        return Err(Error::InvalidRegistration {
            message: format!("'{}' is not an email address", email.trim()),
        });
    }

    Ok(NewRegistration {
        user_id,
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
        nickname: nickname.trim().to_string(),
        tel_number: tel_number.trim().to_string(),
        email: email.trim().to_string(),
    })
}

fn new_transaction(user: &UserModel, claim: &Claim, slip_id: i64) -> NewTransaction {
    NewTransaction {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        amount: claim.amount,
        months_count: claim.months,
        billing_period: claim.billing_period.clone(),
        bank: claim.transfer.as_ref().map(|t| t.bank.clone()),
        transferred_at: claim.transfer.as_ref().map(|t| t.written.clone()),
        slip_id: Some(slip_id),
    }
}

fn admin_claim_message(user: &UserModel, claim: &Claim, tx_id: &str) -> String {
    let mut message = format!(
        "📨 Payment claim from {}\n{} {}\n📞 {}\n📧 {}\n\n💰 {:.2} for {} month(s): {}",
        claim.nickname,
        user.first_name,
        user.last_name,
        user.tel_number,
        user.email,
        claim.amount,
        claim.months,
        claim.billing_period,
    );
    if let Some(transfer) = &claim.transfer {
        message.push_str(&format!("\n🏦 {} at {}", transfer.bank, transfer.written));
    }
    message.push_str(&format!(
        "\n🧾 Transaction: {tx_id}\nUse `/approve {tx_id}` or `/reject {tx_id}`"
    ));
    message
}
