//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, errors::Error, store::UserRepository};

/// Provides autocomplete suggestions for registered nicknames.
///
/// Matches case-insensitively anywhere in the nickname and returns at most 25
/// entries, the Discord limit. Lookup failures simply produce no suggestions.
pub async fn autocomplete_nickname(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(users) = ctx.data().engine.store().list_users().await else {
        return Vec::new();
    };

    matching_nicknames(users.into_iter().map(|user| user.nickname), partial)
}

fn matching_nicknames(nicknames: impl Iterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = nicknames
        .filter(|nickname| nickname.to_lowercase().contains(&partial_lower))
        .take(25) // Discord autocomplete limit
        .collect();

    matching.sort();
    matching
}
