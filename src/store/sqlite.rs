//! `SQLite` repositories on top of `SeaORM`.
//!
//! State transitions are conditional `UPDATE ... WHERE status = 'pending'` statements,
//! so two concurrent decisions on one transaction can never both succeed: the loser
//! sees zero affected rows. The due date and the pending slip pointer are written the
//! same way, guarded on the value the caller expects.

use crate::entities::{
    Slip, SlipModel, Transaction, TransactionColumn, TransactionModel, TransactionStatus, User,
    UserColumn, UserModel, slip, transaction, user,
};
use crate::errors::{Error, Result};
use crate::store::{
    CreditOutcome, NewRegistration, NewTransaction, SlipRepository, TransactionRepository,
    UserRepository,
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveValue::Set,
    Condition, ConnectionTrait, DatabaseConnection, QueryOrder, SqlErr, TransactionTrait,
    prelude::*,
    sea_query::OnConflict,
};
use tracing::debug;

/// Repository implementation backed by a `SeaORM` connection.
#[derive(Debug)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Wraps an open connection whose tables already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Conditional `pending -> status` update usable inside or outside a database transaction.
async fn transition<C: ConnectionTrait>(
    conn: &C,
    tx_id: &str,
    status: TransactionStatus,
    at: NaiveDateTime,
) -> Result<bool> {
    let result = Transaction::update_many()
        .col_expr(TransactionColumn::Status, Expr::value(status))
        .col_expr(TransactionColumn::FinalizedAt, Expr::value(at))
        .filter(TransactionColumn::Id.eq(tx_id))
        .filter(TransactionColumn::Status.eq(TransactionStatus::Pending))
        .exec(conn)
        .await?;

    debug!(tx_id, %status, rows = result.rows_affected, "conditional status update");
    Ok(result.rows_affected == 1)
}

/// Writes the due date and the transaction that earned it, unless the stored due
/// date is already at or past it.
async fn credit_due_date<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    next_due_date: NaiveDateTime,
    approved_tx_id: &str,
) -> Result<bool> {
    let result = User::update_many()
        .col_expr(UserColumn::NextDueDate, Expr::value(next_due_date))
        .col_expr(UserColumn::LastTransactionId, Expr::value(approved_tx_id))
        .filter(UserColumn::Id.eq(user_id))
        .filter(
            Condition::any()
                .add(UserColumn::NextDueDate.is_null())
                .add(UserColumn::NextDueDate.lt(next_due_date)),
        )
        .exec(conn)
        .await?;

    if result.rows_affected == 1 {
        return Ok(true);
    }
    if User::find_by_id(user_id.to_string()).one(conn).await?.is_none() {
        return Err(Error::UserNotFound {
            user_id: user_id.to_string(),
        });
    }
    debug!(user_id, %next_due_date, "stored due date already covers the credit");
    Ok(false)
}

/// Clears the pending slip pointer if it still holds `slip_id`.
async fn release_slip<C: ConnectionTrait>(conn: &C, user_id: &str, slip_id: i64) -> Result<bool> {
    let result = User::update_many()
        .col_expr(UserColumn::PendingSlipId, Expr::value(Option::<i64>::None))
        .col_expr(
            UserColumn::SlipUploadedAt,
            Expr::value(Option::<NaiveDateTime>::None),
        )
        .filter(UserColumn::Id.eq(user_id))
        .filter(UserColumn::PendingSlipId.eq(slip_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

async fn insert_transaction<C: ConnectionTrait>(
    conn: &C,
    new: NewTransaction,
    at: NaiveDateTime,
) -> Result<TransactionModel> {
    let model = transaction::ActiveModel {
        id: Set(new.id),
        user_id: Set(new.user_id),
        amount: Set(new.amount),
        months_count: Set(i32::try_from(new.months_count).unwrap_or(i32::MAX)),
        billing_period: Set(new.billing_period),
        bank: Set(new.bank),
        transferred_at: Set(new.transferred_at),
        slip_id: Set(new.slip_id),
        status: Set(TransactionStatus::Pending),
        created_at: Set(at),
        finalized_at: Set(None),
    };

    model.insert(conn).await.map_err(Into::into)
}

impl UserRepository for SeaOrmStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<UserModel>> {
        User::find_by_id(user_id.to_string())
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<UserModel>> {
        User::find()
            .filter(UserColumn::NicknameKey.eq(user::nickname_key(nickname)))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn list_users(&self) -> Result<Vec<UserModel>> {
        User::find()
            .order_by_asc(UserColumn::Nickname)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn upsert_registration(
        &self,
        registration: &NewRegistration,
        at: NaiveDateTime,
    ) -> Result<UserModel> {
        let model = user::ActiveModel {
            id: Set(registration.user_id.clone()),
            first_name: Set(registration.first_name.clone()),
            last_name: Set(registration.last_name.clone()),
            nickname: Set(registration.nickname.clone()),
            nickname_key: Set(user::nickname_key(&registration.nickname)),
            tel_number: Set(registration.tel_number.clone()),
            email: Set(registration.email.clone()),
            registered_at: Set(at),
            next_due_date: Set(None),
            last_transaction_id: Set(None),
            pending_slip_id: Set(None),
            slip_uploaded_at: Set(None),
        };

        // Only contact columns are replaced on conflict; payment state is kept.
        User::insert(model)
            .on_conflict(
                OnConflict::column(UserColumn::Id)
                    .update_columns([
                        UserColumn::FirstName,
                        UserColumn::LastName,
                        UserColumn::Nickname,
                        UserColumn::NicknameKey,
                        UserColumn::TelNumber,
                        UserColumn::Email,
                        UserColumn::RegisteredAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|err| match err.sql_err() {
                // The primary key conflict is handled above; this is `nickname_key`
                Some(SqlErr::UniqueConstraintViolation(_)) => Error::NicknameTaken {
                    nickname: registration.nickname.clone(),
                },
                _ => err.into(),
            })?;

        self.find_user(&registration.user_id)
            .await?
            .ok_or_else(|| Error::UserNotFound {
                user_id: registration.user_id.clone(),
            })
    }

    async fn update_due_date(
        &self,
        user_id: &str,
        next_due_date: NaiveDateTime,
        approved_tx_id: &str,
    ) -> Result<bool> {
        credit_due_date(&self.db, user_id, next_due_date, approved_tx_id).await
    }

    async fn set_pending_slip_ref(
        &self,
        user_id: &str,
        expected: Option<i64>,
        slip_id: i64,
        at: NaiveDateTime,
    ) -> Result<bool> {
        let holds_expected = match expected {
            Some(previous) => UserColumn::PendingSlipId.eq(previous),
            None => UserColumn::PendingSlipId.is_null(),
        };
        let result = User::update_many()
            .col_expr(UserColumn::PendingSlipId, Expr::value(slip_id))
            .col_expr(UserColumn::SlipUploadedAt, Expr::value(at))
            .filter(UserColumn::Id.eq(user_id))
            .filter(holds_expected)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn clear_pending_slip_ref(&self, user_id: &str, slip_id: i64) -> Result<bool> {
        release_slip(&self.db, user_id, slip_id).await
    }

    async fn users_with_slips_before(&self, cutoff: NaiveDateTime) -> Result<Vec<UserModel>> {
        User::find()
            .filter(UserColumn::PendingSlipId.is_not_null())
            .filter(UserColumn::SlipUploadedAt.lt(cutoff))
            .all(&self.db)
            .await
            .map_err(Into::into)
    }
}

impl TransactionRepository for SeaOrmStore {
    async fn create_transaction(
        &self,
        new: NewTransaction,
        at: NaiveDateTime,
    ) -> Result<TransactionModel> {
        insert_transaction(&self.db, new, at).await
    }

    async fn record_claim(
        &self,
        new: NewTransaction,
        at: NaiveDateTime,
    ) -> Result<Option<TransactionModel>> {
        let txn = self.db.begin().await?;

        if let Some(slip_id) = new.slip_id {
            if !release_slip(&txn, &new.user_id, slip_id).await? {
                txn.rollback().await?;
                return Ok(None);
            }
        }

        let created = match insert_transaction(&txn, new, at).await {
            Ok(created) => created,
            Err(err) => {
                txn.rollback().await?;
                return Err(err);
            }
        };

        txn.commit().await?;
        Ok(Some(created))
    }

    async fn find_transaction(&self, tx_id: &str) -> Result<Option<TransactionModel>> {
        Transaction::find_by_id(tx_id.to_string())
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn transactions_for_user(&self, user_id: &str) -> Result<Vec<TransactionModel>> {
        Transaction::find()
            .filter(TransactionColumn::UserId.eq(user_id))
            .order_by_desc(TransactionColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn transition_if_pending(
        &self,
        tx_id: &str,
        status: TransactionStatus,
        at: NaiveDateTime,
    ) -> Result<bool> {
        transition(&self.db, tx_id, status, at).await
    }

    async fn complete_and_credit(
        &self,
        tx_id: &str,
        user_id: &str,
        next_due_date: NaiveDateTime,
        at: NaiveDateTime,
    ) -> Result<CreditOutcome> {
        let txn = self.db.begin().await?;

        if !transition(&txn, tx_id, TransactionStatus::Completed, at).await? {
            txn.rollback().await?;
            return Ok(CreditOutcome::NotPending);
        }

        match credit_due_date(&txn, user_id, next_due_date, tx_id).await {
            Ok(true) => {}
            Ok(false) => {
                txn.rollback().await?;
                return Ok(CreditOutcome::AlreadyCovered);
            }
            Err(err) => {
                txn.rollback().await?;
                return Err(err);
            }
        }

        txn.commit().await?;
        Ok(CreditOutcome::Credited)
    }
}

impl SlipRepository for SeaOrmStore {
    async fn save_slip(&self, filename: &str, data: Vec<u8>, at: NaiveDateTime) -> Result<i64> {
        let model = slip::ActiveModel {
            filename: Set(filename.to_string()),
            data: Set(data),
            created_at: Set(at),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?.id)
    }

    async fn find_slip(&self, slip_id: i64) -> Result<Option<SlipModel>> {
        Slip::find_by_id(slip_id)
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn delete_slip(&self, slip_id: i64) -> Result<()> {
        Slip::delete_by_id(slip_id).exec(&self.db).await?;
        Ok(())
    }
}
