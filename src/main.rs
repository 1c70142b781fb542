use anyhow::{Context, Result};
use teloxide::dispatching::dialogue::{self, InMemStorage};
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vortex::bot;
use vortex::config::{log_format_from_env, BotConfig, LogFormat};
use vortex::dialogue::EditState;
use vortex::edit_controller::EditController;
use vortex::localization::init_localization;
use vortex::repository::ProjectRepository;
use vortex::storage::JsonFileStore;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    init_tracing(log_format_from_env());

    info!("Starting Vortex Telegram Bot");

    let config = BotConfig::from_env()?;

    init_localization().context("Failed to load message catalogs")?;

    let store = JsonFileStore::new(&config.data_file);
    info!(path = %store.path().display(), "Opening project repository");
    let repository = ProjectRepository::open(store, config.deploy_policy.clone())
        .context("Failed to open project repository")?
        .into_shared();

    let controller = EditController::new(repository, config.edit_policy.clone());

    // Initialize the bot
    let bot = Bot::new(config.telegram_bot_token.clone());

    info!("Bot initialized, starting dispatcher");

    let handler = dialogue::enter::<Update, InMemStorage<EditState>, EditState, _>()
        .branch(Update::filter_message().endpoint(bot::message_handler))
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<EditState>::new(), controller])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
