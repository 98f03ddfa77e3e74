//! Admin commands - approve or reject claims, look members up, run maintenance.
//!
//! Every command here is gated by [`is_admin`].

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        errors::{Error, Result},
    };

    /// Only the configured administrator passes.
    pub async fn is_admin(ctx: poise::Context<'_, BotData, Error>) -> Result<bool> {
        Ok(ctx.author().id == ctx.data().admin_user_id)
    }

    /// Approves a pending claim and credits the member's due date.
    #[poise::command(slash_command, prefix_command, check = "is_admin")]
    pub async fn approve(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Transaction id from the claim notification"] transaction: String,
    ) -> Result<()> {
        let approval = ctx.data().engine.approve(transaction.trim()).await?;

        ctx.say(format!(
            "✅ Approved (next billing cycle: {})",
            approval.next_cycle_label()
        ))
        .await?;
        Ok(())
    }

    /// Rejects a pending claim.
    #[poise::command(slash_command, prefix_command, check = "is_admin")]
    pub async fn reject(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Transaction id from the claim notification"] transaction: String,
    ) -> Result<()> {
        let rejected = ctx.data().engine.reject(transaction.trim()).await?;

        ctx.say(format!("❌ Rejected transaction {}", rejected.id))
            .await?;
        Ok(())
    }

    /// Shows a member's contact details and payment status.
    #[poise::command(slash_command, prefix_command, check = "is_admin")]
    pub async fn lookup(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member nickname"]
        #[autocomplete = "autocomplete::autocomplete_nickname"]
        nickname: String,
    ) -> Result<()> {
        let summary = ctx.data().engine.lookup_nickname(&nickname).await?;
        ctx.say(summary.to_string()).await?;
        Ok(())
    }

    /// Lists members whose paid period has ended.
    #[poise::command(slash_command, prefix_command, check = "is_admin")]
    pub async fn overdue(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let report = ctx.data().engine.overdue_report().await?;
        ctx.say(report.unwrap_or_else(|| "🎉 Everyone is up to date!".to_string()))
            .await?;
        Ok(())
    }

    /// Posts the monthly payment reminder in this channel.
    #[poise::command(slash_command, prefix_command, check = "is_admin")]
    pub async fn remind(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say(ctx.data().engine.monthly_reminder()).await?;
        Ok(())
    }

    /// Discards slips that have waited too long for a claim.
    #[poise::command(slash_command, prefix_command, check = "is_admin")]
    pub async fn sweep(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let swept = ctx.data().engine.sweep_expired_slips().await?;
        ctx.say(format!("🧹 Discarded {swept} expired slip(s)"))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
