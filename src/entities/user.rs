//! User entity - A registered member of the shared account pool.
//!
//! The row is keyed by the chat identity of the member. `next_due_date` is only ever
//! written by an approved transaction and always falls on day 13, 23:59:59 of a month.
//! The pending slip columns hold at most one unconsumed proof-of-payment image.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Folds a nickname for comparison and for the `nickname_key` column.
///
/// Folding happens here rather than in SQL because `SQLite`'s `lower()` only knows ASCII.
#[must_use]
pub fn nickname_key(nickname: &str) -> String {
    nickname.trim().to_lowercase()
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Chat identity of the user (stable per Discord account)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Given name
    pub first_name: String,
    /// Family name (may contain spaces)
    pub last_name: String,
    /// Nickname used in payment claims, as registered
    pub nickname: String,
    /// Case-folded nickname; the unique index that keeps nicknames distinct ignoring case
    #[sea_orm(unique)]
    pub nickname_key: String,
    /// Contact phone number
    pub tel_number: String,
    /// Contact email
    pub email: String,
    /// When the user last registered or re-registered
    pub registered_at: DateTime,
    /// Instant through which the subscription is covered (day 13, 23:59:59)
    pub next_due_date: Option<DateTime>,
    /// Transaction that produced the current `next_due_date`
    pub last_transaction_id: Option<String>,
    /// Uploaded slip waiting to be attached to a claim
    pub pending_slip_id: Option<i64>,
    /// When the pending slip was uploaded, used for expiry
    pub slip_uploaded_at: Option<DateTime>,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
