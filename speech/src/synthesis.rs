//! Cached remote synthesis with bounded retries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::backend::SpeechBackend;
use crate::cache::{CacheKey, SpeechAsset, SpeechCache};
use crate::error::{BackendError, SynthesisError};
use crate::normalizer::{has_sentence_punctuation, normalize, strip_punctuation};

/// Retry and fallback policy for [`SynthesisClient`].
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Attempts per text before giving up on it.
    pub max_attempts: usize,
    /// Delay before retry `n` (0-based) is `backoff_step * (n + 1)`.
    pub backoff_step: Duration,
    /// Retry once with `. ? ! ,` removed after all attempts fail.
    pub strip_punctuation_fallback: bool,
    /// Let concurrent callers for one key share a single request.
    pub coalesce_in_flight: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(200),
            strip_punctuation_fallback: true,
            coalesce_in_flight: true,
        }
    }
}

impl SynthesisConfig {
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    pub fn with_punctuation_fallback(mut self, enabled: bool) -> Self {
        self.strip_punctuation_fallback = enabled;
        self
    }

    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce_in_flight = enabled;
        self
    }
}

/// Turns text into cached, decoded speech.
///
/// Text is normalized before it becomes a cache key or a request. A cache
/// miss goes to the backend with linear backoff between attempts; if every
/// attempt fails and the text has sentence punctuation, one more round runs
/// on the stripped text. Success is always cached under the original key.
pub struct SynthesisClient {
    backend: Arc<dyn SpeechBackend>,
    cache: Arc<SpeechCache>,
    config: SynthesisConfig,
    in_flight: parking_lot::Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>,
}

impl SynthesisClient {
    /// Creates a client with its own empty cache.
    pub fn new(backend: Arc<dyn SpeechBackend>) -> Self {
        Self::with_cache(backend, Arc::new(SpeechCache::new()))
    }

    /// Creates a client over an existing cache.
    pub fn with_cache(backend: Arc<dyn SpeechBackend>, cache: Arc<SpeechCache>) -> Self {
        Self {
            backend,
            cache,
            config: SynthesisConfig::default(),
            in_flight: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn with_config(mut self, config: SynthesisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<SpeechCache> {
        &self.cache
    }

    /// Returns the cache key `text` resolves to for `voice`.
    pub fn cache_key(text: &str, voice: &str) -> CacheKey {
        CacheKey::new(voice, normalize(text).into_owned())
    }

    /// Returns true if `text` is already cached for `voice`.
    pub fn is_cached(&self, text: &str, voice: &str) -> bool {
        self.cache.contains(&Self::cache_key(text, voice))
    }

    /// Returns cached speech for `text`, synthesizing it on a miss.
    pub async fn synthesize(&self, text: &str, voice: &str) -> Result<SpeechAsset, SynthesisError> {
        let key = Self::cache_key(text, voice);
        if let Some(asset) = self.cache.get(&key) {
            debug!(%key, "speech cache hit");
            return Ok(asset);
        }

        if !self.config.coalesce_in_flight {
            return self.fetch_and_store(&key).await;
        }

        let guard = self.lock_key(&key).await;
        let result = match self.cache.get(&key) {
            Some(asset) => {
                debug!(%key, "speech cache filled while waiting");
                Ok(asset)
            }
            None => self.fetch_and_store(&key).await,
        };
        drop(guard);
        self.release_key(&key);
        result
    }

    async fn lock_key(&self, key: &CacheKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut in_flight = self.in_flight.lock();
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    fn release_key(&self, key: &CacheKey) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            in_flight.remove(key);
        }
    }

    async fn fetch_and_store(&self, key: &CacheKey) -> Result<SpeechAsset, SynthesisError> {
        let asset = self.fetch(&key.text, &key.voice).await?;
        self.cache.put(key.clone(), Arc::clone(&asset));
        info!(%key, duration_ms = asset.duration().as_millis() as u64, "speech cached");
        Ok(asset)
    }

    async fn fetch(&self, text: &str, voice: &str) -> Result<SpeechAsset, SynthesisError> {
        let (mut attempts, mut last) = match self.attempt_all(text, voice).await {
            Ok(asset) => return Ok(asset),
            Err(failure) => failure,
        };

        if self.config.strip_punctuation_fallback && has_sentence_punctuation(text) {
            let stripped = strip_punctuation(text);
            if !stripped.is_empty() {
                info!(voice, original = text, stripped = %stripped, "retrying without punctuation");
                match self.attempt_all(&stripped, voice).await {
                    Ok(asset) => return Ok(asset),
                    Err((more, err)) => {
                        attempts += more;
                        last = err;
                    }
                }
            }
        }

        warn!(voice, text, attempts, error = %last, "synthesis exhausted");
        Err(SynthesisError {
            text: text.to_string(),
            voice: voice.to_string(),
            attempts,
            source: last,
        })
    }

    /// Runs up to `max_attempts` attempts for one text. Stops early on a
    /// non-retryable failure. Returns the attempt count with the last error.
    async fn attempt_all(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<SpeechAsset, (usize, BackendError)> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let result = self
                .backend
                .synthesize(text, voice)
                .await
                .and_then(|raw| raw.decode());
            attempt += 1;

            let err = match result {
                Ok(buffer) => return Ok(Arc::new(buffer)),
                Err(err) => err,
            };
            warn!(voice, text, attempt, error = %err, "synthesis attempt failed");

            if !err.is_retryable() || attempt >= max_attempts {
                return Err((attempt, err));
            }
            tokio::time::sleep(self.config.backoff_step * attempt as u32).await;
        }
    }
}
