use crate::i18n::Language;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned by a translation backend
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation client is closed")]
    Closed,

    #[error("failed to reach translation api: {0}")]
    Request(#[from] reqwest::Error),

    #[error("translation api error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("translation api response contained no translations")]
    EmptyResponse,
}

/// Remote translation backend.
///
/// `close` is irreversible: every call that starts or completes after it
/// must fail with [`TranslationError::Closed`].
#[async_trait]
pub trait Translator: Send + Sync {
    /// Catalog of languages the backend can translate between
    async fn supported_languages(&self) -> Result<Vec<Language>, TranslationError>;

    /// Translate `input` from `source_code` into `target_code`.
    ///
    /// An empty `source_code` asks the backend to detect the source language.
    async fn translate(
        &self,
        source_code: &str,
        target_code: &str,
        input: &str,
    ) -> Result<String, TranslationError>;

    fn close(&self);
}

/// Options for [`CloudTranslator`]
#[derive(Debug, Clone)]
pub struct CloudTranslatorOptions {
    /// Base URL of the v3 REST API (e.g., "https://translation.googleapis.com/v3")
    pub api_url: String,
    pub project_id: String,
    /// OAuth bearer token sent with every request, if set
    pub access_token: Option<String>,
}

/// Cloud Translation v3 request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateTextRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    source_language_code: Option<&'a str>,
    target_language_code: &'a str,
    contents: [&'a str; 1],
    mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateTextResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct SupportedLanguagesResponse {
    #[serde(default)]
    languages: Vec<SupportedLanguage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SupportedLanguage {
    language_code: String,
    #[serde(default)]
    display_name: String,
}

/// Client for the Cloud Translation v3 REST API.
pub struct CloudTranslator {
    client: reqwest::Client,
    options: CloudTranslatorOptions,
    closed: AtomicBool,
}

impl CloudTranslator {
    pub fn new(client: reqwest::Client, options: CloudTranslatorOptions) -> Self {
        info!(
            "Creating cloud translation api client for project {}",
            options.project_id
        );
        Self {
            client,
            options,
            closed: AtomicBool::new(false),
        }
    }

    fn parent_url(&self) -> String {
        format!(
            "{}/projects/{}/locations/global",
            self.options.api_url.trim_end_matches('/'),
            self.options.project_id
        )
    }

    fn ensure_open(&self) -> Result<(), TranslationError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TranslationError::Closed);
        }
        Ok(())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.options.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-2xx response into an API error carrying status and body
    async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, TranslationError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        Err(TranslationError::Api { status, body })
    }
}

#[async_trait]
impl Translator for CloudTranslator {
    async fn supported_languages(&self) -> Result<Vec<Language>, TranslationError> {
        self.ensure_open()?;
        info!("Loading available languages from cloud translation api");

        let request = self
            .client
            .get(format!("{}/supportedLanguages", self.parent_url()))
            .query(&[("displayLanguageCode", "en")]);
        let response = Self::check_status(self.authorize(request).send().await?).await?;
        let catalog: SupportedLanguagesResponse = response.json().await?;

        Ok(catalog
            .languages
            .into_iter()
            .map(|lang| Language::new(lang.display_name, lang.language_code))
            .collect())
    }

    async fn translate(
        &self,
        source_code: &str,
        target_code: &str,
        input: &str,
    ) -> Result<String, TranslationError> {
        self.ensure_open()?;

        let body = TranslateTextRequest {
            source_language_code: Some(source_code).filter(|code| !code.is_empty()),
            target_language_code: target_code,
            contents: [input],
            mime_type: "text/plain",
        };

        debug!(
            "Requesting translation {} -> {} ({} bytes)",
            if source_code.is_empty() { "auto" } else { source_code },
            target_code,
            input.len()
        );

        let request = self
            .client
            .post(format!("{}:translateText", self.parent_url()))
            .json(&body);
        let response = Self::check_status(self.authorize(request).send().await?).await?;
        let parsed: TranslateTextResponse = response.json().await?;

        // A close that happened while the call was in flight wins
        self.ensure_open()?;

        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or(TranslationError::EmptyResponse)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Cloud translation api client closed");
        }
    }
}
