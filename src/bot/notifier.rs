//! Discord delivery of engine notifications.
//!
//! Users and the administrator are reached by direct message. Admin messages carry
//! the proof-of-payment image as a file attachment.

use crate::core::notify::{NotificationSink, SlipAttachment};
use crate::errors::{Error, Result};
use poise::serenity_prelude::{self as serenity, CreateAttachment, CreateMessage, UserId};
use std::sync::Arc;

/// [`NotificationSink`] backed by the Discord HTTP API.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Arc<serenity::Http>,
    admin_user_id: UserId,
}

impl DiscordNotifier {
    /// Notifier sending admin messages to `admin_user_id`.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>, admin_user_id: UserId) -> Self {
        Self {
            http,
            admin_user_id,
        }
    }
}

/// Engine user ids are Discord user ids in decimal.
fn discord_user(user_id: &str) -> Result<UserId> {
    user_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(UserId::new)
        .ok_or_else(|| Error::UserNotFound {
            user_id: user_id.to_string(),
        })
}

fn admin_message(message: &str, attachments: &[SlipAttachment]) -> CreateMessage {
    attachments.iter().fold(
        CreateMessage::new().content(message),
        |builder, attachment| {
            builder.add_file(CreateAttachment::bytes(
                attachment.data.clone(),
                attachment.filename.clone(),
            ))
        },
    )
}

impl NotificationSink for DiscordNotifier {
    async fn notify_user(&self, user_id: &str, message: &str) -> Result<()> {
        discord_user(user_id)?
            .direct_message(self.http.as_ref(), CreateMessage::new().content(message))
            .await?;
        Ok(())
    }

    async fn notify_admin(&self, message: &str, attachments: &[SlipAttachment]) -> Result<()> {
        self.admin_user_id
            .direct_message(self.http.as_ref(), admin_message(message, attachments))
            .await?;
        Ok(())
    }
}
