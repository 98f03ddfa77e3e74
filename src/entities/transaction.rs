//! Transaction entity - One payment claim awaiting or past admin review.
//!
//! Each transaction records what the user claimed to have paid (`amount`,
//! `months_count`, `billing_period`) plus optional bank transfer details, and moves
//! through a one-way `pending -> completed | rejected` state machine.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Review state of a transaction. `Pending` is the only initial state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TransactionStatus {
    /// Waiting for an admin decision
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved; the user's due date has been credited
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Rejected by the admin
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl TransactionStatus {
    /// Completed and rejected transactions never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique token generated per claim (UUID v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Claimed amount
    pub amount: f64,
    /// Number of billing months the claim covers
    pub months_count: i32,
    /// Free-text billing period, e.g. `"ม.ค. 68 - ก.พ. 68"`
    pub billing_period: String,
    /// Bank named in the inline claim layout
    pub bank: Option<String>,
    /// Transfer day/month/year/time as written in the inline claim layout
    pub transferred_at: Option<String>,
    /// Proof-of-payment image consumed by this claim
    pub slip_id: Option<i64>,
    /// Review state
    pub status: TransactionStatus,
    /// When the claim was submitted
    pub created_at: DateTime,
    /// When the transaction reached `completed` or `rejected`
    pub finalized_at: Option<DateTime>,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
