//! Session-scoped store of synthesized audio.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use speakboard_audio::PcmBuffer;

/// A decoded, playable synthesis result. Shared by reference, so two cache
/// hits for the same key return the same allocation.
pub type SpeechAsset = Arc<PcmBuffer>;

/// Identifies one synthesis result: the voice plus the normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub voice: String,
    pub text: String,
}

impl CacheKey {
    /// Creates a key from already-normalized text.
    pub fn new(voice: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.voice, self.text)
    }
}

/// Unbounded map from [`CacheKey`] to [`SpeechAsset`].
///
/// No eviction or expiry. Concurrent writers to one key race and the last
/// one wins.
#[derive(Default)]
pub struct SpeechCache {
    entries: RwLock<HashMap<CacheKey, SpeechAsset>>,
}

impl SpeechCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<SpeechAsset> {
        self.entries.read().get(key).cloned()
    }

    pub fn put(&self, key: CacheKey, asset: SpeechAsset) {
        self.entries.write().insert(key, asset);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every entry. Used on session teardown.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakboard_audio::Format;

    fn asset(len: usize) -> SpeechAsset {
        Arc::new(PcmBuffer::new(Format::MONO_24K, vec![0.0; len]))
    }

    #[test]
    fn test_get_put() {
        let cache = SpeechCache::new();
        let key = CacheKey::new("V", "Hello");
        assert!(cache.get(&key).is_none());

        let a = asset(10);
        cache.put(key.clone(), a.clone());
        assert!(Arc::ptr_eq(&cache.get(&key).unwrap(), &a));
        assert!(cache.contains(&key));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_voice_is_part_of_key() {
        let cache = SpeechCache::new();
        cache.put(CacheKey::new("A", "Hello"), asset(1));
        assert!(!cache.contains(&CacheKey::new("B", "Hello")));
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = SpeechCache::new();
        let key = CacheKey::new("V", "Hi");
        cache.put(key.clone(), asset(1));
        let second = asset(2);
        cache.put(key.clone(), second.clone());
        assert!(Arc::ptr_eq(&cache.get(&key).unwrap(), &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = SpeechCache::new();
        cache.put(CacheKey::new("V", "a"), asset(1));
        cache.put(CacheKey::new("V", "b"), asset(1));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(CacheKey::new("Kore", "Hello").to_string(), "Kore:Hello");
    }
}
