//! Administrator identity from environment variables.
//!
//! Approvals, rejections and lookups are restricted to the single Discord account
//! named by `ADMIN_USER_ID` in the `.env` file.

use crate::errors::{Error, Result};
use poise::serenity_prelude::UserId;

/// Environment variable holding the administrator's Discord user id
pub const ADMIN_USER_ID_VAR: &str = "ADMIN_USER_ID";

/// Parses a Discord user id (a non-zero snowflake).
pub fn parse_user_id(raw: &str) -> Result<UserId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(UserId::new)
        .ok_or_else(|| Error::Config {
            message: format!("{ADMIN_USER_ID_VAR} must be a Discord user id, got '{raw}'"),
        })
}

/// Reads the administrator id from `ADMIN_USER_ID`.
pub fn get_admin_user_id() -> Result<UserId> {
    let raw = std::env::var(ADMIN_USER_ID_VAR)?;
    parse_user_id(&raw)
}
