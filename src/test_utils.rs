//! Shared test utilities for `SlipBuddy`.
//!
//! This module provides an in-memory database, a controllable clock, a notifier
//! that records instead of sending, and builders with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    config::settings::BillingSettings,
    core::{
        engine::BillingEngine,
        notify::{Clock, NotificationSink, SlipAttachment},
        period::MonthYear,
    },
    entities::{SlipModel, TransactionModel, TransactionStatus, UserModel},
    errors::{Error, Result},
    store::{
        CreditOutcome, NewRegistration, NewTransaction, SeaOrmStore, SlipRepository,
        TransactionRepository, UserRepository,
    },
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

/// Engine wired to test collaborators.
pub type TestEngine = BillingEngine<SeaOrmStore, RecordingNotifier, FixedClock>;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Repository over a fresh in-memory database.
pub async fn setup_test_store() -> Result<SeaOrmStore> {
    Ok(SeaOrmStore::new(setup_test_db().await?))
}

/// Engine with default settings whose clock reads `now`.
/// Returns the notifier handle for inspecting sent messages.
pub async fn setup_engine(now: NaiveDateTime) -> Result<(TestEngine, RecordingNotifier)> {
    let notifier = RecordingNotifier::default();
    let engine = BillingEngine::new(
        setup_test_store().await?,
        notifier.clone(),
        FixedClock::new(now),
        BillingSettings::default(),
    );
    Ok((engine, notifier))
}

/// Like [`setup_engine`], but returns the clock handle instead.
pub async fn setup_engine_with_clock(now: NaiveDateTime) -> Result<(TestEngine, FixedClock)> {
    let clock = FixedClock::new(now);
    let engine = BillingEngine::new(
        setup_test_store().await?,
        RecordingNotifier::default(),
        clock.clone(),
        BillingSettings::default(),
    );
    Ok((engine, clock))
}

/// 10:00 on the given day.
pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// Close of the given month's billing cycle (day 13, 23:59:59).
pub fn cycle(year: i32, month: u32) -> NaiveDateTime {
    MonthYear::new(year, month).unwrap().cycle_end().unwrap()
}

/// Registration with sensible defaults.
///
/// # Defaults
/// * `first_name`: `"Chanadda"`, `last_name`: `"Khonchom"`
/// * `tel_number`: `"0812345678"`
/// * `email`: lowercase nickname at example.com
pub fn registration(user_id: &str, nickname: &str) -> NewRegistration {
    NewRegistration {
        user_id: user_id.to_string(),
        first_name: "Chanadda".to_string(),
        last_name: "Khonchom".to_string(),
        nickname: nickname.to_string(),
        tel_number: "0812345678".to_string(),
        email: format!("{}@example.com", nickname.to_lowercase()),
    }
}

/// One-month, 41.50 claim for the given billing period, without a slip.
pub fn new_transaction(id: &str, user_id: &str, billing_period: &str) -> NewTransaction {
    NewTransaction {
        id: id.to_string(),
        user_id: user_id.to_string(),
        amount: 41.5,
        months_count: 1,
        billing_period: billing_period.to_string(),
        bank: None,
        transferred_at: None,
        slip_id: None,
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    /// Clock reading `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Jumps to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }

    /// Moves forward by `by`.
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

/// Admin message text and the bytes of each attachment.
pub type AdminMessage = (String, Vec<Vec<u8>>);

/// Notifier that keeps every message for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    users: Arc<Mutex<Vec<(String, String)>>>,
    admin: Arc<Mutex<Vec<AdminMessage>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    /// Makes every later delivery fail, as an unreachable chat service would.
    pub fn fail_deliveries(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// `(user_id, message)` pairs delivered so far.
    pub fn user_messages(&self) -> Vec<(String, String)> {
        self.users.lock().unwrap().clone()
    }

    /// Admin messages delivered so far.
    pub fn admin_messages(&self) -> Vec<AdminMessage> {
        self.admin.lock().unwrap().clone()
    }

    fn check_delivery(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("delivery failed")));
        }
        Ok(())
    }
}

impl NotificationSink for RecordingNotifier {
    async fn notify_user(&self, user_id: &str, message: &str) -> Result<()> {
        self.check_delivery()?;
        self.users
            .lock()
            .unwrap()
            .push((user_id.to_string(), message.to_string()));
        Ok(())
    }

    async fn notify_admin(&self, message: &str, attachments: &[SlipAttachment]) -> Result<()> {
        self.check_delivery()?;
        let images = attachments.iter().map(|a| a.data.clone()).collect();
        self.admin
            .lock()
            .unwrap()
            .push((message.to_string(), images));
        Ok(())
    }
}

/// Routes `tracing` output through the test harness; safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Store call after which a [`Race`] fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceStep {
    /// `find_slip`, read by a claim before it is recorded
    FindSlip,
    /// `save_slip`, written by an upload before it moves the pointer
    SaveSlip,
    /// `users_with_slips_before`, read by the sweep
    ExpiredSlips,
}

/// Work another request performs in the middle of the engine's operation.
#[derive(Debug, Clone)]
pub enum Race {
    /// The user uploads a new slip, replacing and deleting the pending one
    Upload {
        /// Uploader
        user_id: String,
        /// Image bytes
        data: Vec<u8>,
    },
    /// A claim consuming the pending slip is recorded
    Claim(NewTransaction),
}

/// Store that runs one [`Race`] right after a chosen call returns, as if a
/// concurrent request had been scheduled there.
#[derive(Debug)]
pub struct RacingStore {
    inner: SeaOrmStore,
    race: Mutex<Option<(RaceStep, Race)>>,
}

impl RacingStore {
    /// Wraps a fresh in-memory store.
    pub async fn new() -> Result<Self> {
        Ok(Self {
            inner: setup_test_store().await?,
            race: Mutex::new(None),
        })
    }

    /// Schedules `race` to run once, after the next `step`.
    pub fn schedule(&self, step: RaceStep, race: Race) {
        *self.race.lock().unwrap() = Some((step, race));
    }

    fn take(&self, step: RaceStep) -> Option<Race> {
        let mut scheduled = self.race.lock().unwrap();
        match scheduled.as_ref() {
            Some((at, _)) if *at == step => scheduled.take().map(|(_, race)| race),
            _ => None,
        }
    }

    async fn run(&self, step: RaceStep) -> Result<()> {
        let Some(race) = self.take(step) else {
            return Ok(());
        };
        let now = at(2025, 3, 2);
        match race {
            Race::Upload { user_id, data } => {
                let previous = self
                    .inner
                    .find_user(&user_id)
                    .await?
                    .and_then(|user| user.pending_slip_id);
                let slip_id = self.inner.save_slip("racing.jpg", data, now).await?;
                if self
                    .inner
                    .set_pending_slip_ref(&user_id, previous, slip_id, now)
                    .await?
                {
                    if let Some(previous) = previous {
                        self.inner.delete_slip(previous).await?;
                    }
                }
            }
            Race::Claim(transaction) => {
                self.inner.record_claim(transaction, now).await?;
            }
        }
        Ok(())
    }
}

/// Engine over a [`RacingStore`].
pub type RacingEngine = BillingEngine<RacingStore, RecordingNotifier, FixedClock>;

/// Engine with default settings over a [`RacingStore`], and its clock.
pub async fn setup_racing_engine(now: NaiveDateTime) -> Result<(RacingEngine, FixedClock)> {
    let clock = FixedClock::new(now);
    let engine = BillingEngine::new(
        RacingStore::new().await?,
        RecordingNotifier::default(),
        clock.clone(),
        BillingSettings::default(),
    );
    Ok((engine, clock))
}

impl UserRepository for RacingStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<UserModel>> {
        self.inner.find_user(user_id).await
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<UserModel>> {
        self.inner.find_by_nickname(nickname).await
    }

    async fn list_users(&self) -> Result<Vec<UserModel>> {
        self.inner.list_users().await
    }

    async fn upsert_registration(
        &self,
        registration: &NewRegistration,
        at: NaiveDateTime,
    ) -> Result<UserModel> {
        self.inner.upsert_registration(registration, at).await
    }

    async fn update_due_date(
        &self,
        user_id: &str,
        next_due_date: NaiveDateTime,
        approved_tx_id: &str,
    ) -> Result<bool> {
        self.inner
            .update_due_date(user_id, next_due_date, approved_tx_id)
            .await
    }

    async fn set_pending_slip_ref(
        &self,
        user_id: &str,
        expected: Option<i64>,
        slip_id: i64,
        at: NaiveDateTime,
    ) -> Result<bool> {
        self.inner
            .set_pending_slip_ref(user_id, expected, slip_id, at)
            .await
    }

    async fn clear_pending_slip_ref(&self, user_id: &str, slip_id: i64) -> Result<bool> {
        self.inner.clear_pending_slip_ref(user_id, slip_id).await
    }

    async fn users_with_slips_before(&self, cutoff: NaiveDateTime) -> Result<Vec<UserModel>> {
        let users = self.inner.users_with_slips_before(cutoff).await?;
        self.run(RaceStep::ExpiredSlips).await?;
        Ok(users)
    }
}

impl TransactionRepository for RacingStore {
    async fn create_transaction(
        &self,
        transaction: NewTransaction,
        at: NaiveDateTime,
    ) -> Result<TransactionModel> {
        self.inner.create_transaction(transaction, at).await
    }

    async fn record_claim(
        &self,
        transaction: NewTransaction,
        at: NaiveDateTime,
    ) -> Result<Option<TransactionModel>> {
        self.inner.record_claim(transaction, at).await
    }

    async fn find_transaction(&self, tx_id: &str) -> Result<Option<TransactionModel>> {
        self.inner.find_transaction(tx_id).await
    }

    async fn transactions_for_user(&self, user_id: &str) -> Result<Vec<TransactionModel>> {
        self.inner.transactions_for_user(user_id).await
    }

    async fn transition_if_pending(
        &self,
        tx_id: &str,
        status: TransactionStatus,
        at: NaiveDateTime,
    ) -> Result<bool> {
        self.inner.transition_if_pending(tx_id, status, at).await
    }

    async fn complete_and_credit(
        &self,
        tx_id: &str,
        user_id: &str,
        next_due_date: NaiveDateTime,
        at: NaiveDateTime,
    ) -> Result<CreditOutcome> {
        self.inner
            .complete_and_credit(tx_id, user_id, next_due_date, at)
            .await
    }
}

impl SlipRepository for RacingStore {
    async fn save_slip(&self, filename: &str, data: Vec<u8>, at: NaiveDateTime) -> Result<i64> {
        let slip_id = self.inner.save_slip(filename, data, at).await?;
        self.run(RaceStep::SaveSlip).await?;
        Ok(slip_id)
    }

    async fn find_slip(&self, slip_id: i64) -> Result<Option<SlipModel>> {
        let slip = self.inner.find_slip(slip_id).await?;
        self.run(RaceStep::FindSlip).await?;
        Ok(slip)
    }

    async fn delete_slip(&self, slip_id: i64) -> Result<()> {
        self.inner.delete_slip(slip_id).await
    }
}
