//! Unified error types for `SlipBuddy`.
//!
//! [`ClaimError`] is the tagged outcome of reading a free-text payment claim: every
//! way a claim can be malformed has its own variant. [`Error`] wraps it together with
//! the duplicate, not-found, already-finalized and system failures of the engine.

use crate::entities::TransactionStatus;
use thiserror::Error;

/// Why a claim's text was refused. Always user-facing, never mutates state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    /// Fewer tokens or lines than the layout requires
    #[error(
        "❌ Incomplete claim. Send: nickname, amount, months, billing period (one per line)"
    )]
    MissingFields,

    /// The amount token is not a non-negative decimal
    #[error("❌ 'amount' must be a number, got '{value}'")]
    InvalidAmount {
        /// The offending token
        value: String,
    },

    /// The month-count token is not a positive integer
    #[error("❌ 'months' must be a whole number greater than zero, got '{value}'")]
    InvalidMonthCount {
        /// The offending token
        value: String,
    },

    /// No token matched the bank whitelist in the inline layout
    #[error("❌ No supported bank found (must be one of: {supported})")]
    UnknownBank {
        /// Comma-separated whitelist
        supported: String,
    },

    /// The bank appeared before any billing period token
    #[error("❌ Missing 'billing period' before the bank name")]
    MissingBillingPeriod,

    /// The transfer date is not exactly day, month, year and time
    #[error("❌ Invalid transfer date/time (example: 26 ม.ค. 68 10:30:00)")]
    InvalidTransferDateTime,

    /// The transfer day is not a day of month
    #[error("❌ Invalid transfer day '{value}'")]
    InvalidTransferDay {
        /// The offending token
        value: String,
    },

    /// The transfer month is not one of the month abbreviations
    #[error("❌ Invalid month abbreviation '{value}'")]
    InvalidTransferMonth {
        /// The offending token
        value: String,
    },

    /// The transfer year is not a 2 or 4 digit number
    #[error("❌ Invalid transfer year '{value}'")]
    InvalidTransferYear {
        /// The offending token
        value: String,
    },

    /// The transfer time is not `H:MM` or `H:MM:SS`
    #[error("❌ Invalid transfer time '{value}' (expected H:MM or H:MM:SS)")]
    InvalidTransferTime {
        /// The offending token
        value: String,
    },

    /// A billing range spans a different number of months than declared
    #[error("⚠️ Month count mismatch: claimed {declared} month(s) but the period spans {counted}")]
    MonthCountMismatch {
        /// Months declared in the claim
        declared: u32,
        /// Inclusive months covered by the stated range
        counted: i64,
    },

    /// A multi-month claim names a single month without a range
    #[error(
        "⚠️ Ambiguous period: claimed {declared} months but named a single month \
         (use a range such as 'ม.ค. 68 - มี.ค. 68')"
    )]
    AmbiguousPeriod {
        /// Months declared in the claim
        declared: u32,
    },
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed claim (validation error)
    #[error("{0}")]
    Claim(#[from] ClaimError),

    /// Claim starts at or before an already-covered month
    #[error(
        "❌ Duplicate payment: already paid through {covered_through} \
         ({claimed_start} is inside the covered period)"
    )]
    DuplicateClaim {
        /// Covered cycle, e.g. `"กุมภาพันธ์ 68"`
        covered_through: String,
        /// Start of the claimed period as written by the user
        claimed_start: String,
    },

    /// Registration input is incomplete or malformed
    #[error("❌ {message}")]
    InvalidRegistration {
        /// What is wrong with the input
        message: String,
    },

    /// Another user already registered this nickname
    #[error("❌ Nickname '{nickname}' is already taken")]
    NicknameTaken {
        /// Requested nickname
        nickname: String,
    },

    /// Claim nickname differs from the registered one
    #[error("❌ Nickname does not match your registration")]
    NicknameMismatch,

    /// Action requires registration first
    #[error("⛔ Please register first with /register")]
    NotRegistered,

    /// No proof-of-payment image is waiting for this user
    #[error("⚠️ No slip found. Please upload your transfer slip first")]
    NoPendingSlip,

    /// Unknown user id
    #[error("❌ User not found: {user_id}")]
    UserNotFound {
        /// Requested user id
        user_id: String,
    },

    /// Unknown transaction id
    #[error("❌ Transaction not found: {tx_id}")]
    TransactionNotFound {
        /// Requested transaction id
        tx_id: String,
    },

    /// Approve/reject on a transaction that already left `pending`
    #[error("⚠️ Transaction {tx_id} was already {status}")]
    AlreadyFinalized {
        /// Transaction id
        tx_id: String,
        /// Terminal status it holds
        status: TransactionStatus,
    },

    /// The credited due date would fall outside the supported calendar
    #[error("❌ Transaction {tx_id} covers a period outside the supported calendar")]
    DueDateOutOfRange {
        /// Transaction id
        tx_id: String,
    },

    /// Configuration problem
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Storage failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Chat transport failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Whether the message can be shown to the user as-is.
    ///
    /// System failures (storage, transport, configuration) are not: they are logged
    /// and replaced by [`SYSTEM_APOLOGY`].
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Config { .. }
                | Self::Database(_)
                | Self::Io(_)
                | Self::EnvVar(_)
                | Self::Framework(_)
        )
    }

    /// Text to send back to the chat.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_user_facing() {
            self.to_string()
        } else {
            SYSTEM_APOLOGY.to_string()
        }
    }
}

/// Reply used in place of system error details.
pub const SYSTEM_APOLOGY: &str = "Something went wrong on our side, please try again later 🙏";

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_errors_are_user_facing() {
        let err = Error::from(ClaimError::MonthCountMismatch {
            declared: 2,
            counted: 3,
        });
        assert!(err.is_user_facing());
        let message = err.user_message();
        assert!(message.contains('2'));
        assert!(message.contains('3'));
    }

    #[test]
    fn test_system_errors_are_hidden() {
        let err = Error::Database(sea_orm::DbErr::Custom("disk full".to_string()));
        assert!(!err.is_user_facing());
        assert_eq!(err.user_message(), SYSTEM_APOLOGY);
    }

    #[test]
    fn test_out_of_range_due_date_is_user_facing() {
        let err = Error::DueDateOutOfRange {
            tx_id: "abc".to_string(),
        };
        assert!(err.is_user_facing());
        assert!(err.user_message().contains("abc"));
    }

    #[test]
    fn test_already_finalized_names_status() {
        let err = Error::AlreadyFinalized {
            tx_id: "abc".to_string(),
            status: TransactionStatus::Completed,
        };
        assert!(err.is_user_facing());
        assert!(err.user_message().contains("completed"));
    }
}
