use anyhow::{Context, Result};
use tracing::{error, info, Instrument};
use translate_cache::app::{App, AppOptions};
use translate_cache::config::Config;
use translate_cache::runner::RunnerManager;
use translate_cache::{logging, signals};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when the variables come from the environment)
    let _ = dotenvy::dotenv();

    // Load configuration from environment
    let config = Config::from_env()?;

    // Initialize logging
    logging::init(&config.logger)?;

    info!("Starting translator -- version {}", env!("CARGO_PKG_VERSION"));
    info!("Log level set to: {}", config.logger.output_level);

    let span = tracing::info_span!(
        "translator",
        app_id = config.logger.app_id.as_deref().unwrap_or_default()
    );

    run(config)
        .instrument(span)
        .await
        .inspect_err(|e| error!("{:#}", e))
}

async fn run(config: Config) -> Result<()> {
    let token = signals::shutdown_token();

    let app = App::new(AppOptions::from(&config))
        .await
        .context("Error while creating translator")?;

    RunnerManager::new()
        .add(move |token| async move { app.run(token).await })
        .run(&token)
        .await
        .context("Error while running translator")?;

    info!("Translator shut down gracefully");
    Ok(())
}
