//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Admin-only commands
pub mod admin;

/// General utility commands
pub mod general;

/// Payment commands
pub mod payment;

/// Registration and status commands
pub mod registration;

// Export commands
pub use admin::*;
pub use general::*;
pub use payment::*;
pub use registration::*;

use crate::{bot::BotData, errors::Error};

/// Every command the bot registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ping(),
        help(),
        register(),
        status(),
        slip(),
        pay(),
        approve(),
        reject(),
        lookup(),
        overdue(),
        remind(),
        sweep(),
    ]
}
