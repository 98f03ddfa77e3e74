//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for `SlipBuddy`: slash/prefix commands,
//! autocomplete, the Discord [`NotificationSink`](crate::core::notify::NotificationSink)
//! and the background slip sweep.

/// Discord command implementations (general, registration, payment, admin)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;
/// Direct-message delivery of engine notifications
pub mod notifier;

use crate::{
    config::settings::BillingSettings,
    core::{engine::BillingEngine, notify::SystemClock},
    errors::{Error, Result},
    store::SeaOrmStore,
};
use notifier::DiscordNotifier;
use poise::serenity_prelude as serenity;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, instrument, warn};

/// The engine as wired for production.
pub type Engine = BillingEngine<SeaOrmStore, DiscordNotifier, SystemClock>;

/// Shared data available to all bot commands.
pub struct BotData {
    /// Billing engine shared with the background sweep
    pub engine: Arc<Engine>,
    /// Account allowed to run admin commands
    pub admin_user_id: serenity::UserId,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(engine: Arc<Engine>, admin_user_id: serenity::UserId) -> Self {
        Self {
            engine,
            admin_user_id,
        }
    }
}

/// Replies to failed commands. User-facing errors are echoed, system errors are
/// logged and replaced by an apology.
async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                debug!(command = %ctx.command().name, %error, "command refused");
            } else {
                error!(command = %ctx.command().name, ?error, "command failed");
            }
            if let Err(e) = ctx.say(error.user_message()).await {
                error!("Failed to send error message: {e}");
            }
        }
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            if let Some(error) = error {
                error!(command = %ctx.command().name, ?error, "command check failed");
            }
            if let Err(e) = ctx.say("⛔ This command is for the admin only").await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Runs the slip sweep every `every` until the process exits.
pub fn spawn_slip_sweeper(engine: Arc<Engine>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match engine.sweep_expired_slips().await {
                Ok(0) => {}
                Ok(swept) => info!(swept, "background sweep discarded expired slips"),
                Err(e) => warn!(error = %e, "background sweep failed"),
            }
        }
    })
}

/// Connects to Discord and serves commands until the client stops.
#[instrument(skip_all)]
pub async fn run_bot(
    token: String,
    store: SeaOrmStore,
    clock: SystemClock,
    settings: BillingSettings,
    admin_user_id: serenity::UserId,
) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".to_string()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered commands globally");

                let sweep_every = settings.sweep_interval();
                let notifier = DiscordNotifier::new(Arc::clone(&ctx.http), admin_user_id);
                let engine = Arc::new(BillingEngine::new(store, notifier, clock, settings));
                spawn_slip_sweeper(Arc::clone(&engine), sweep_every);

                Ok(BotData::new(engine, admin_user_id))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Starting Discord client");
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e}"))?;

    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e}"))?;
    Ok(())
}
