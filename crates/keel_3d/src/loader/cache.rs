//! Template cache
//!
//! Parsed templates are kept in an LRU keyed by asset path and handed out
//! as `Arc`s, so a cached template is shared and never mutated.

use crate::scene::SceneTemplate;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Statistics about the template cache
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CacheStats {
    /// Number of entries in the cache
    pub entries: usize,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Total scene nodes held by cached templates
    pub total_nodes: usize,
}

impl CacheStats {
    /// Get the hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

/// LRU cache of loaded templates
pub struct TemplateCache {
    entries: LruCache<PathBuf, Arc<SceneTemplate>>,
    hits: u64,
    misses: u64,
}

impl TemplateCache {
    /// Create a cache holding at most `max_entries` templates (minimum 1)
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Get a template, marking it most recently used
    pub fn get(&mut self, path: &Path) -> Option<Arc<SceneTemplate>> {
        match self.entries.get(path) {
            Some(template) => {
                self.hits += 1;
                Some(Arc::clone(template))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, path: PathBuf, template: Arc<SceneTemplate>) {
        if let Some((evicted, _)) = self.entries.push(path.clone(), template) {
            if evicted != path {
                tracing::debug!(path = %evicted.display(), "template evicted");
            }
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains(path)
    }

    pub fn remove(&mut self, path: &Path) -> Option<Arc<SceneTemplate>> {
        self.entries.pop(path)
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.entries.cap().get()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            total_nodes: self.entries.iter().map(|(_, t)| t.nodes.len()).sum(),
        }
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(4)
    }
}
