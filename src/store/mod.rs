//! Persistence seams.
//!
//! The engine is written against these repository traits rather than a concrete
//! database, so tests and the bot can share one implementation while the state
//! machine rules stay in `core`. [`SeaOrmStore`] is the `SQLite` implementation.
//!
//! Writes that race are conditional and report whether they applied:
//! [`TransactionRepository::transition_if_pending`] and
//! [`TransactionRepository::complete_and_credit`] only act on a row that is still
//! `pending`, a due date only ever moves forward, and the pending slip pointer is
//! swapped or cleared only while it still holds the slip the caller saw.

/// `SeaORM` implementation of the repositories
pub mod sqlite;

pub use sqlite::SeaOrmStore;

use crate::entities::{SlipModel, TransactionModel, TransactionStatus, UserModel};
use crate::errors::Result;
use chrono::NaiveDateTime;
use std::future::Future;

/// Contact details captured at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    /// Chat identity of the user
    pub user_id: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Nickname used in claims
    pub nickname: String,
    /// Phone number
    pub tel_number: String,
    /// Email address
    pub email: String,
}

/// A claim about to be stored as a `pending` transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Generated transaction token
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Claimed amount
    pub amount: f64,
    /// Months covered
    pub months_count: u32,
    /// Billing period phrase as written
    pub billing_period: String,
    /// Bank from the inline layout
    pub bank: Option<String>,
    /// Transfer date/time as written
    pub transferred_at: Option<String>,
    /// Consumed slip image
    pub slip_id: Option<i64>,
}

/// Outcome of [`TransactionRepository::complete_and_credit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    /// Transaction completed and due date written
    Credited,
    /// The transaction had already left `pending`; nothing written
    NotPending,
    /// The stored due date is already at or past the new one; nothing written
    AlreadyCovered,
}

/// Registered users and their pending slip pointer.
pub trait UserRepository: Send + Sync {
    /// Looks a user up by chat identity.
    fn find_user(&self, user_id: &str)
    -> impl Future<Output = Result<Option<UserModel>>> + Send;

    /// Looks a user up by nickname, ignoring case.
    fn find_by_nickname(
        &self,
        nickname: &str,
    ) -> impl Future<Output = Result<Option<UserModel>>> + Send;

    /// All users, ordered by nickname.
    fn list_users(&self) -> impl Future<Output = Result<Vec<UserModel>>> + Send;

    /// Inserts a user, or replaces the contact details of an existing one.
    ///
    /// Payment state (due date, last transaction, pending slip) survives re-registration.
    fn upsert_registration(
        &self,
        registration: &NewRegistration,
        at: NaiveDateTime,
    ) -> impl Future<Output = Result<UserModel>> + Send;

    /// Records the due date credited by an approved transaction.
    ///
    /// Returns `false` without writing when the stored due date is already at or
    /// past `next_due_date`; a due date never moves backward.
    fn update_due_date(
        &self,
        user_id: &str,
        next_due_date: NaiveDateTime,
        approved_tx_id: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Points the user at a freshly uploaded slip, provided their pointer still holds
    /// `expected`. Returns `false` when it moved in the meantime or the user is unknown.
    fn set_pending_slip_ref(
        &self,
        user_id: &str,
        expected: Option<i64>,
        slip_id: i64,
        at: NaiveDateTime,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Forgets the user's pending slip if it is still `slip_id`.
    fn clear_pending_slip_ref(
        &self,
        user_id: &str,
        slip_id: i64,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Users holding a slip uploaded strictly before `cutoff`.
    fn users_with_slips_before(
        &self,
        cutoff: NaiveDateTime,
    ) -> impl Future<Output = Result<Vec<UserModel>>> + Send;
}

/// Payment claims and their review state machine.
pub trait TransactionRepository: Send + Sync {
    /// Stores a new `pending` transaction.
    fn create_transaction(
        &self,
        transaction: NewTransaction,
        at: NaiveDateTime,
    ) -> impl Future<Output = Result<TransactionModel>> + Send;

    /// Stores a new `pending` transaction and consumes the user's pending slip
    /// `transaction.slip_id`, atomically.
    ///
    /// Returns `None` and writes nothing when the user's pointer no longer holds that
    /// slip (a newer upload or the expiry sweep got there first).
    fn record_claim(
        &self,
        transaction: NewTransaction,
        at: NaiveDateTime,
    ) -> impl Future<Output = Result<Option<TransactionModel>>> + Send;

    /// Looks a transaction up by id.
    fn find_transaction(
        &self,
        tx_id: &str,
    ) -> impl Future<Output = Result<Option<TransactionModel>>> + Send;

    /// A user's transactions, newest first.
    fn transactions_for_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<TransactionModel>>> + Send;

    /// Moves a `pending` transaction to `status`.
    ///
    /// Returns `false` without writing when the transaction is missing or no longer
    /// pending, which is how a lost race shows up.
    fn transition_if_pending(
        &self,
        tx_id: &str,
        status: TransactionStatus,
        at: NaiveDateTime,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Completes a `pending` transaction and credits the user's due date, atomically.
    ///
    /// Writes nothing unless both succeed: the transaction must still be `pending`
    /// and the new due date must lie after the stored one.
    fn complete_and_credit(
        &self,
        tx_id: &str,
        user_id: &str,
        next_due_date: NaiveDateTime,
        at: NaiveDateTime,
    ) -> impl Future<Output = Result<CreditOutcome>> + Send;
}

/// Stored proof-of-payment images.
pub trait SlipRepository: Send + Sync {
    /// Stores an image and returns its id.
    fn save_slip(
        &self,
        filename: &str,
        data: Vec<u8>,
        at: NaiveDateTime,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Loads an image.
    fn find_slip(&self, slip_id: i64) -> impl Future<Output = Result<Option<SlipModel>>> + Send;

    /// Deletes an image; deleting a missing image is not an error.
    fn delete_slip(&self, slip_id: i64) -> impl Future<Output = Result<()>> + Send;
}

/// Everything the billing engine persists.
pub trait Store: UserRepository + TransactionRepository + SlipRepository {}

impl<T> Store for T where T: UserRepository + TransactionRepository + SlipRepository {}
