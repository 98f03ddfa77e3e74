//! Member commands - `register` and `status`.
//!
//! Replies carry contact details, so they are sent ephemerally.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
        store::NewRegistration,
    };
    use poise::CreateReply;

    /// Registers you as a member, or updates your contact details.
    ///
    /// The nickname is what you type in payment claims and must be unique.
    #[poise::command(slash_command, prefix_command)]
    pub async fn register(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "First name"] first_name: String,
        #[description = "Last name"] last_name: String,
        #[description = "Nickname used in payment claims (one word)"] nickname: String,
        #[description = "Phone number"] phone: String,
        #[description = "Email address"] email: String,
    ) -> Result<()> {
        let registration = NewRegistration {
            user_id: ctx.author().id.to_string(),
            first_name,
            last_name,
            nickname,
            tel_number: phone,
            email,
        };

        let user = ctx.data().engine.register(registration).await?;

        ctx.send(
            CreateReply::default()
                .content(format!(
                    "✅ Registered! Welcome {} ({})\nUpload your transfer slip with `/slip` when you pay.",
                    user.nickname, user.email
                ))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Shows which billing cycle you have paid through.
    #[poise::command(slash_command, prefix_command)]
    pub async fn status(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = ctx.author().id.to_string();
        let status = ctx.data().engine.payment_status(&user_id).await?;

        ctx.send(
            CreateReply::default()
                .content(status.to_string())
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
