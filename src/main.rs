use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use translatebot::config::Config;
use translatebot::platform::telegram::{self, TelegramConnector};
use translatebot::translate::{GoogleTranslator, Translator};
use translatebot::webhook::{self, AppState};

const USAGE: &str = "usage: translatebot [poll|webhook] [config.toml]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,translatebot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // .env is optional; real environment variables win
    let _ = dotenvy::dotenv();

    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "poll".to_string());
    let config_path = args.next().map(PathBuf::from);

    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;
    info!("Configuration loaded");
    info!("  Webhook base URL: {:?}", config.webhook.base_url);
    info!("  Translator: {}", config.translator.base_url);

    let translator: Arc<dyn Translator> = Arc::new(
        GoogleTranslator::new(&config.translator).context("Failed to build translation client")?,
    );
    let connector =
        TelegramConnector::new(&config.telegram).context("Invalid Telegram configuration")?;

    match mode.as_str() {
        "poll" => {
            let token = match config.telegram.require_token() {
                Ok(token) => token,
                Err(e) => {
                    error!("{}", e);
                    return Err(e.into());
                }
            };
            info!("bot is running...");
            telegram::run_polling(connector.build_bot(token), translator).await?;
        }
        "webhook" => {
            let state = AppState::new(config, translator, Arc::new(connector));
            webhook::serve(state).await?;
        }
        other => bail!("unknown mode '{}'\n{}", other, USAGE),
    }

    Ok(())
}
