use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::cache::{KeyValueStore, MemoryStore, StoreError};
use crate::i18n::Language;
use crate::translation::{TranslationError, Translator};

/// In-memory store that counts every operation.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    fail_writes: bool,
    gets: AtomicUsize,
    sets: AtomicUsize,
    exists: AtomicUsize,
}

impl CountingStore {
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn total_ops(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
            + self.sets.load(Ordering::SeqCst)
            + self.exists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            let err = redis::RedisError::from((redis::ErrorKind::ReadOnly, "read-only replica"));
            return Err(err.into());
        }
        self.inner.set(key, value).await
    }

    async fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        self.exists.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(key).await
    }
}

/// Translator answering every request with a fixed reply (or a 500).
pub struct FakeTranslator {
    reply: Option<String>,
    languages: Vec<Language>,
    calls: AtomicUsize,
    last_request: Mutex<Option<(String, String, String)>>,
    closed: AtomicBool,
}

impl FakeTranslator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            languages: vec![
                Language::new("English", "en"),
                Language::new("French", "fr"),
                Language::new("German", "de"),
            ],
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            ..Self::replying("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<(String, String, String)> {
        self.last_request.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn supported_languages(&self) -> Result<Vec<Language>, TranslationError> {
        Ok(self.languages.clone())
    }

    async fn translate(
        &self,
        source_code: &str,
        target_code: &str,
        input: &str,
    ) -> Result<String, TranslationError> {
        if self.is_closed() {
            return Err(TranslationError::Closed);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((
            source_code.to_string(),
            target_code.to_string(),
            input.to_string(),
        ));

        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(TranslationError::Api {
                status: 500,
                body: "backend exploded".to_string(),
            }),
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
