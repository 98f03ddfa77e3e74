//! Payment commands - `slip` uploads the proof image, `pay` submits the claim.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::debug;

    /// Uploads your transfer slip. Send the claim with `/pay` afterwards.
    ///
    /// A new slip replaces one you uploaded earlier but have not claimed yet.
    #[poise::command(slash_command, prefix_command)]
    pub async fn slip(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Screenshot of the bank transfer"] image: serenity::Attachment,
    ) -> Result<()> {
        let is_image = image
            .content_type
            .as_deref()
            .is_some_and(|kind| kind.starts_with("image/"));
        if !is_image {
            ctx.say("❌ Please attach the slip as an image").await?;
            return Ok(());
        }

        let user_id = ctx.author().id.to_string();
        let data = image.download().await?;
        debug!(filename = %image.filename, bytes = data.len(), "slip downloaded");

        ctx.data()
            .engine
            .attach_slip(&user_id, &image.filename, data)
            .await?;

        ctx.say(
            "📥 Slip received! Now send the details with `!pay`, one per line:\n\
             ```\n!pay\n[nickname]\n[amount]\n[months]\n[billing period]\n```\n\
             Example:\n```\n!pay\nFai\n41.50\n2\nธ.ค. 68 - ม.ค. 69\n```",
        )
        .await?;
        Ok(())
    }

    /// Submits a payment claim for the slip you uploaded.
    ///
    /// Either one field per line (nickname, amount, months, billing period) or a
    /// single line that also names the bank and the transfer date and time.
    #[poise::command(slash_command, prefix_command)]
    pub async fn pay(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "nickname amount months period [bank day month year time]"]
        #[rest]
        claim: String,
    ) -> Result<()> {
        let user_id = ctx.author().id.to_string();
        ctx.data().engine.submit_claim(&user_id, &claim).await?;

        ctx.say("✅ Claim recorded! The admin will review it shortly ⏳")
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
