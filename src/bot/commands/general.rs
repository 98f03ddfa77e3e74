//! General Discord commands - ping and help.
//! These don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**SlipBuddy Help**\n\
        Billing cycles close on the 13th of every month.\n\n\
        **Getting Started**\n\
        • `/register <first> <last> <nickname> <phone> <email>` - Registers you (once).\n\
        • `/status` - Shows which cycle you have paid through.\n\n\
        **Paying**\n\
        1. `/slip <image>` - Upload your transfer slip first.\n\
        2. `!pay` followed by one field per line:\n\
        ```\n!pay\nFai\n41.50\n2\nธ.ค. 68 - ม.ค. 69\n```\n\
        or on one line with bank and transfer time:\n\
        ```\n/pay Fai 41.50 1 ม.ค. 69 KBank 12 ม.ค. 69 10:30\n```\n\
        **Admin Commands**\n\
        • `/approve <tx>` / `/reject <tx>` - Decide on a pending claim.\n\
        • `/lookup <nickname>` - Shows a member and their payment status.\n\
        • `/overdue` - Lists members with outstanding payments.\n\
        • `/remind` - Posts the monthly payment reminder.\n\
        • `/sweep` - Discards expired slips now.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
