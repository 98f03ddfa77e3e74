use dotenvy::dotenv;
use slipbuddy::{
    bot,
    config::{admin, database, settings},
    core::notify::SystemClock,
    errors::{Error, Result},
    store::SeaOrmStore,
};
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Settings and administrator identity
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load settings: {e}"))?;
    let admin_user_id =
        admin::get_admin_user_id().inspect_err(|e| error!("ADMIN_USER_ID not usable: {e}"))?;
    let clock = SystemClock::new(app_config.billing.utc_offset_hours)?;

    // 4. Database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(
        token,
        SeaOrmStore::new(db),
        clock,
        app_config.billing,
        admin_user_id,
    )
    .await
}
