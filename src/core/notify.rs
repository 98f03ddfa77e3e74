//! Outbound notifications.
//!
//! The engine never talks to the chat platform directly. It hands messages to a
//! [`NotificationSink`], and delivery failures are logged by the caller and dropped:
//! a lost notification must never undo a state change that already committed.
//!
//! [`Clock`] is the other injected collaborator: every timestamp the engine writes
//! comes from it, in the billing time zone.

use crate::errors::{Error, Result};
use chrono::{FixedOffset, NaiveDateTime, Utc};
use std::future::Future;

/// An image forwarded alongside an admin notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlipAttachment {
    /// File name shown in the chat
    pub filename: String,
    /// Raw image bytes
    pub data: Vec<u8>,
}

/// Delivers messages to users and to the administrator.
pub trait NotificationSink: Send + Sync {
    /// Sends a direct message to one user.
    fn notify_user(&self, user_id: &str, message: &str)
    -> impl Future<Output = Result<()>> + Send;

    /// Sends a message, with optional images, to the administrator.
    fn notify_admin(
        &self,
        message: &str,
        attachments: &[SlipAttachment],
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Wall-clock time in the billing time zone.
    fn now(&self) -> NaiveDateTime;
}

/// Real time shifted to a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Clock for a whole-hour UTC offset (`7` for Bangkok).
    pub fn new(utc_offset_hours: i32) -> Result<Self> {
        let offset = utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| Error::Config {
                message: format!("utc_offset_hours out of range: {utc_offset_hours}"),
            })?;
        Ok(Self { offset })
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}
