use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::{KeyValueStore, RedisStore, ResultCache};
use crate::config::Config;
use crate::i18n::LanguageRegistry;
use crate::pipeline::TranslationPipeline;
use crate::retry::{with_retry_if, RetryConfig};
use crate::runner::RunnerManager;
use crate::server::{HttpServer, ServerOptions};
use crate::translation::{CloudTranslator, CloudTranslatorOptions, TranslationError, Translator};
use crate::web;

/// Timeout for a single call to the translation api
const BACKEND_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for [`App::new`]
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub app_port: u16,
    pub gcp_project_id: String,
    pub gcp_access_token: Option<String>,
    pub translation_api_url: String,
    pub redis_host: String,
    pub redis_port: u16,
    pub ready_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl From<&Config> for AppOptions {
    fn from(config: &Config) -> Self {
        Self {
            app_port: config.app_port,
            gcp_project_id: config.gcp_project_id.clone(),
            gcp_access_token: config.gcp_access_token.clone(),
            translation_api_url: config.translation_api_url.clone(),
            redis_host: config.redis_host.clone(),
            redis_port: config.redis_port,
            ready_timeout: config.ready_timeout,
            shutdown_timeout: config.shutdown_timeout,
        }
    }
}

pub struct App {
    server: Arc<HttpServer>,
    ready_timeout: Duration,
}

impl App {
    /// Connect to the translation api and Redis and assemble the server.
    ///
    /// Fails if the language catalog cannot be loaded or Redis is unreachable.
    pub async fn new(options: AppOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(BACKEND_REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        let translator = Arc::new(CloudTranslator::new(
            client,
            CloudTranslatorOptions {
                api_url: options.translation_api_url.clone(),
                project_id: options.gcp_project_id.clone(),
                access_token: options.gcp_access_token.clone(),
            },
        ));

        let store = RedisStore::connect(&options.redis_host, options.redis_port)
            .await
            .context("Failed to connect to Redis")?;

        Self::with_components(
            translator,
            Arc::new(store),
            ServerOptions {
                addr: SocketAddr::from(([0, 0, 0, 0], options.app_port)),
                shutdown_timeout: options.shutdown_timeout,
            },
            options.ready_timeout,
        )
        .await
    }

    /// Assemble the app around an existing backend and store.
    pub async fn with_components(
        translator: Arc<dyn Translator>,
        store: Arc<dyn KeyValueStore>,
        server_options: ServerOptions,
        ready_timeout: Duration,
    ) -> Result<Self> {
        let registry = load_registry(translator.as_ref()).await?;

        let pipeline = Arc::new(TranslationPipeline::new(
            Arc::new(registry),
            ResultCache::new(store),
            Arc::clone(&translator),
        ));

        let server = Arc::new(HttpServer::new(
            web::router(pipeline),
            translator,
            server_options,
        ));

        Ok(Self {
            server,
            ready_timeout,
        })
    }

    pub fn server(&self) -> &Arc<HttpServer> {
        &self.server
    }

    /// Serve until `token` is cancelled or either lifecycle task fails.
    ///
    /// Two tasks run side by side: the server itself, and a waiter that
    /// confirms the listener came up in time and then holds until shutdown.
    pub async fn run(&self, token: CancellationToken) -> Result<()> {
        info!("App is starting");

        let server = Arc::clone(&self.server);
        let waiter = Arc::clone(&self.server);
        let ready_timeout = self.ready_timeout;

        RunnerManager::new()
            .add(move |token| async move {
                server
                    .run(token)
                    .await
                    .context("failed to run http server")
            })
            .add(move |token| async move {
                waiter
                    .ready(ready_timeout, &token)
                    .await
                    .context("http server did not become ready in time")?;
                info!("Http server started");
                token.cancelled().await;
                Ok(())
            })
            .run(&token)
            .await
    }
}

async fn load_registry(translator: &dyn Translator) -> Result<LanguageRegistry> {
    let languages = with_retry_if(
        &RetryConfig::catalog_load(),
        "Loading language catalog",
        || translator.supported_languages(),
        is_retryable,
    )
    .await
    .context("Failed to load supported languages of cloud translation api")?;

    info!("Loaded {} supported languages", languages.len());
    Ok(LanguageRegistry::from_languages(languages))
}

/// Retry rate limiting, 5xx and network errors; other failures are final
fn is_retryable(error: &TranslationError) -> bool {
    match error {
        TranslationError::Api { status, .. } => *status == 429 || *status >= 500,
        TranslationError::Request(_) => true,
        TranslationError::Closed | TranslationError::EmptyResponse => false,
    }
}
