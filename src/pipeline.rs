use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheKey, ResultCache};
use crate::i18n::LanguageRegistry;
use crate::translation::{TranslationError, Translator};

pub struct TranslationPipeline {
    registry: Arc<LanguageRegistry>,
    cache: ResultCache,
    translator: Arc<dyn Translator>,
}

impl TranslationPipeline {
    pub fn new(
        registry: Arc<LanguageRegistry>,
        cache: ResultCache,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            registry,
            cache,
            translator,
        }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Translate `raw_input` between two languages given by display name.
    ///
    /// Unknown display names are not rejected: they resolve to an empty ISO
    /// code which is passed on as is. An empty source code lets the backend
    /// detect the source language; an empty target code is left for the
    /// backend to refuse.
    ///
    /// # Returns
    /// * `Ok("")` if the input is empty after trimming (cache and backend untouched)
    /// * `Ok(text)` from the cache or from the backend
    /// * `Err` if the backend call failed (nothing is cached)
    pub async fn translate(
        &self,
        source_name: &str,
        target_name: &str,
        raw_input: &str,
    ) -> Result<String, TranslationError> {
        let source = self.registry.by_display_name(source_name);
        let target = self.registry.by_display_name(target_name);

        if !source.is_resolved() || !target.is_resolved() {
            debug!(
                "Unresolved language name (source: {:?} -> {:?}, target: {:?} -> {:?})",
                source_name,
                source.iso_code(),
                target_name,
                target.iso_code()
            );
        }

        let input = raw_input.trim();
        if input.is_empty() {
            return Ok(String::new());
        }

        let key = CacheKey::derive(input, target.iso_code());

        debug!("Checking if translation is cached: {}", key);
        if self.cache.has(&key).await {
            match self.cache.get(&key).await {
                Ok(Some(cached)) => {
                    info!("Retrieved translation from cache: {}", key);
                    return Ok(cached);
                }
                Ok(None) => warn!("Cache entry {} vanished between check and read", key),
                Err(e) => warn!("Failed to read cached translation {}: {}", key, e),
            }
        }

        info!("Retrieving translation from cloud translation api: {}", key);
        let translated = self
            .translator
            .translate(source.iso_code(), target.iso_code(), input)
            .await
            .inspect_err(|e| error!("Failed to translate text: {}", e))?;

        debug!("Storing translation in cache: {}", key);
        if let Err(e) = self.cache.add(&key, &translated).await {
            error!("Failed to cache translation {}: {}", key, e);
        }

        Ok(translated)
    }
}
