//! Bulk vocabulary preloading in bounded concurrent batches.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::synthesis::SynthesisClient;
use crate::vocabulary::{Vocabulary, speakable_texts};

/// Batch policy for [`BulkPreloader`].
#[derive(Debug, Clone)]
pub struct PreloadConfig {
    /// Synthesis calls in flight per batch.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_yield: Duration,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            batch_size: 15,
            batch_yield: Duration::from_millis(20),
        }
    }
}

impl PreloadConfig {
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_batch_yield(mut self, pause: Duration) -> Self {
        self.batch_yield = pause;
        self
    }
}

/// Outcome of one preload sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreloadReport {
    /// Unique speakable strings.
    pub total: usize,
    /// Already cached before the sweep.
    pub cached: usize,
    /// Synthesized during the sweep.
    pub fetched: usize,
    /// `(text, error)` for every item that failed.
    pub failed: Vec<(String, String)>,
}

impl PreloadReport {
    /// Items accounted for, successful or not.
    pub fn completed(&self) -> usize {
        self.cached + self.fetched + self.failed.len()
    }
}

/// Warms the speech cache for a whole vocabulary.
pub struct BulkPreloader {
    synthesis: Arc<SynthesisClient>,
    config: PreloadConfig,
}

impl BulkPreloader {
    pub fn new(synthesis: Arc<SynthesisClient>) -> Self {
        Self {
            synthesis,
            config: PreloadConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PreloadConfig) -> Self {
        self.config = config;
        self
    }

    /// Synthesizes every speakable tile not yet cached for `voice`.
    ///
    /// `on_progress(completed, total)` fires once before any network call
    /// with the cache hits counted, then once per finished pending item.
    /// Failures are counted as completed and reported, never propagated.
    pub async fn preload<F>(&self, vocabulary: &Vocabulary, voice: &str, on_progress: F) -> PreloadReport
    where
        F: FnMut(usize, usize) + Send,
    {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        let mut report = PreloadReport::default();

        for text in speakable_texts(vocabulary) {
            let key = SynthesisClient::cache_key(&text, voice);
            if !seen.insert(key.clone()) {
                continue;
            }
            report.total += 1;
            if self.synthesis.cache().contains(&key) {
                report.cached += 1;
            } else {
                pending.push(text);
            }
        }

        let total = report.total;
        let progress = Mutex::new((report.cached, on_progress));
        {
            let mut guard = progress.lock();
            let (completed, callback) = &mut *guard;
            callback(*completed, total);
        }
        info!(voice, total, cached = report.cached, pending = pending.len(), "preload started");

        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<&[String]> = pending.chunks(batch_size).collect();
        let batch_count = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            debug!(batch = index + 1, of = batch_count, size = batch.len(), "preload batch");

            let results = join_all(batch.iter().map(|text| {
                let progress = &progress;
                async move {
                    let result = self.synthesis.synthesize(text, voice).await;
                    let mut guard = progress.lock();
                    let (completed, callback) = &mut *guard;
                    *completed += 1;
                    callback(*completed, total);
                    (text, result)
                }
            }))
            .await;

            for (text, result) in results {
                match result {
                    Ok(_) => report.fetched += 1,
                    Err(err) => {
                        warn!(voice, text = %text, error = %err, "preload item failed");
                        report.failed.push((text.clone(), err.to_string()));
                    }
                }
            }

            if index + 1 < batch_count {
                tokio::time::sleep(self.config.batch_yield).await;
            }
        }

        info!(
            voice,
            total,
            fetched = report.fetched,
            failed = report.failed.len(),
            "preload finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreloadConfig::default();
        assert_eq!(config.batch_size, 15);
        assert_eq!(config.batch_yield, Duration::from_millis(20));
        assert_eq!(config.with_batch_size(0).batch_size, 1);
    }

    #[test]
    fn test_report_completed() {
        let report = PreloadReport {
            total: 5,
            cached: 2,
            fetched: 2,
            failed: vec![("x".into(), "boom".into())],
        };
        assert_eq!(report.completed(), 5);
    }
}
