//! Scene asset loading
//!
//! - [`SceneSource`] parses one file format into a [`SceneTemplate`]
//! - [`SourceRegistry`] picks a source by file extension
//! - [`SceneLoader`] runs parsing off the frame loop and hands results back
//!   by [`LoadTicket`]; only the newest ticket's result is ever delivered
//! - [`TextureCache`] decodes textures once per source
//!
//! # Example
//!
//! ```ignore
//! let runtime = tokio::runtime::Runtime::new()?;
//! let mut loader = SceneLoader::new(runtime.handle().clone(), SourceRegistry::new(), 4);
//! let ticket = loader.request("assets/models/lagoon.glb");
//! // every frame:
//! if let Some(done) = loader.poll() {
//!     assert_eq!(done.ticket, ticket);
//! }
//! ```

mod cache;
#[cfg(feature = "gltf")]
mod gltf;
mod texture;

pub use cache::{CacheStats, TemplateCache};
#[cfg(feature = "gltf")]
pub use self::gltf::GltfSource;
pub use texture::{TextureCache, TextureData};

use crate::error::LoadError;
use crate::scene::SceneTemplate;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Parses one asset format
pub trait SceneSource: Send + Sync {
    /// Load a template from a file path
    fn load(&self, path: &Path) -> Result<SceneTemplate, LoadError>;

    /// Get supported file extensions
    fn supported_extensions(&self) -> &[&str];

    /// Check if this source can handle the given extension
    fn can_load(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// Get the source name for debugging
    fn name(&self) -> &'static str;
}

/// Registry of available scene sources
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn SceneSource>>,
}

impl SourceRegistry {
    /// Create a registry with every built-in source
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();

        #[cfg(feature = "gltf")]
        registry.register(Arc::new(GltfSource::new()));

        registry
    }

    /// Create a registry with no sources
    pub fn empty() -> Self {
        Self { sources: Vec::new() }
    }

    /// Register a custom source, consulted before earlier ones
    pub fn register(&mut self, source: Arc<dyn SceneSource>) {
        self.sources.insert(0, source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Load a file with the first source that handles its extension
    pub fn load(&self, path: &Path) -> Result<SceneTemplate, LoadError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let source = self
            .sources
            .iter()
            .find(|s| s.can_load(extension))
            .ok_or_else(|| LoadError::UnsupportedFormat(extension.to_string()))?;
        tracing::debug!(path = %path.display(), source = source.name(), "loading scene");
        source.load(path)
    }
}

/// Identity of one load request; later requests get larger tickets
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// A finished load
#[derive(Debug)]
pub struct LoadResult {
    pub ticket: LoadTicket,
    pub path: PathBuf,
    pub result: Result<Arc<SceneTemplate>, LoadError>,
}

fn lock(cache: &Mutex<TemplateCache>) -> MutexGuard<'_, TemplateCache> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Asynchronous template loader with cancel-on-supersede
///
/// Parsing runs on the runtime's blocking pool. Results come back over a
/// channel that [`poll`](Self::poll) drains once per frame; a result whose
/// ticket is older than the newest request is dropped.
pub struct SceneLoader {
    runtime: Handle,
    registry: Arc<SourceRegistry>,
    cache: Arc<Mutex<TemplateCache>>,
    tx: mpsc::UnboundedSender<LoadResult>,
    rx: mpsc::UnboundedReceiver<LoadResult>,
    next_ticket: u64,
    pending: Option<LoadTicket>,
}

impl SceneLoader {
    pub fn new(runtime: Handle, registry: SourceRegistry, cache_size: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            registry: Arc::new(registry),
            cache: Arc::new(Mutex::new(TemplateCache::new(cache_size))),
            tx,
            rx,
            next_ticket: 0,
            pending: None,
        }
    }

    /// Start loading `path`, superseding any load still in flight
    pub fn request(&mut self, path: impl Into<PathBuf>) -> LoadTicket {
        let path = path.into();
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        if let Some(stale) = self.pending.replace(ticket) {
            tracing::debug!(stale = stale.id(), ticket = ticket.id(), "load superseded");
        }

        if let Some(template) = lock(&self.cache).get(&path) {
            tracing::debug!(path = %path.display(), ticket = ticket.id(), "template cache hit");
            let _ = self.tx.send(LoadResult {
                ticket,
                path,
                result: Ok(template),
            });
            return ticket;
        }

        let registry = Arc::clone(&self.registry);
        let cache = Arc::clone(&self.cache);
        let tx = self.tx.clone();
        self.runtime.spawn_blocking(move || {
            let result = registry.load(&path).map(Arc::new);
            if let Ok(template) = &result {
                lock(&cache).insert(path.clone(), Arc::clone(template));
            }
            // The receiver only goes away with the loader itself
            let _ = tx.send(LoadResult { ticket, path, result });
        });
        ticket
    }

    /// Collect the newest finished load, if it is the one still wanted
    pub fn poll(&mut self) -> Option<LoadResult> {
        let mut delivered = None;
        while let Ok(done) = self.rx.try_recv() {
            if Some(done.ticket) == self.pending {
                self.pending = None;
                delivered = Some(done);
            } else {
                tracing::debug!(ticket = done.ticket.id(), "discarding superseded load");
            }
        }
        delivered
    }

    /// Block until the pending load finishes or `timeout` passes
    ///
    /// For headless use; the frame loop calls [`poll`](Self::poll).
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadResult> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(done) = self.poll() {
                return Some(done);
            }
            if self.pending.is_none() || Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    /// Whether a requested load has not been delivered yet
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_ticket(&self) -> Option<LoadTicket> {
        self.pending
    }

    /// Get template cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        lock(&self.cache).stats()
    }

    /// Put a template in the cache under `path`, e.g. a built-in fallback
    pub fn preload(&self, path: impl Into<PathBuf>, template: SceneTemplate) {
        lock(&self.cache).insert(path.into(), Arc::new(template));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Builds a one-node template named after the file, after an optional delay
    struct FakeSource {
        calls: AtomicUsize,
        slow_suffix: &'static str,
    }

    impl SceneSource for FakeSource {
        fn load(&self, path: &Path) -> Result<SceneTemplate, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            if stem == "broken" {
                return Err(LoadError::Parse("bad header".into()));
            }
            if stem.ends_with(self.slow_suffix) {
                std::thread::sleep(Duration::from_millis(150));
            }
            let mut b = SceneTemplate::builder(stem);
            b.group(stem, None);
            Ok(b.build())
        }

        fn supported_extensions(&self) -> &[&str] {
            &["fake"]
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap()
    }

    fn loader(runtime: &tokio::runtime::Runtime) -> (SceneLoader, Arc<FakeSource>) {
        let source = Arc::new(FakeSource {
            calls: AtomicUsize::new(0),
            slow_suffix: "slow",
        });
        let mut registry = SourceRegistry::empty();
        registry.register(source.clone());
        (SceneLoader::new(runtime.handle().clone(), registry, 2), source)
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_load_and_cache() {
        let rt = runtime();
        let (mut loader, source) = loader(&rt);

        let ticket = loader.request("lagoon.fake");
        assert!(loader.is_pending());
        let done = loader.wait(TIMEOUT).unwrap();
        assert_eq!(done.ticket, ticket);
        let first = done.result.unwrap();
        assert_eq!(first.name, "lagoon");
        assert!(!loader.is_pending());

        loader.request("lagoon.fake");
        let second = loader.wait(TIMEOUT).unwrap().result.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.cache_stats().hits, 1);
    }

    #[test]
    fn test_superseded_load_is_discarded() {
        let rt = runtime();
        let (mut loader, _) = loader(&rt);

        let stale = loader.request("lagoon-slow.fake");
        let fresh = loader.request("tide.fake");
        assert!(fresh > stale);

        let done = loader.wait(TIMEOUT).unwrap();
        assert_eq!(done.ticket, fresh);
        assert_eq!(done.result.unwrap().name, "tide");

        // Let the slow load finish; it must not surface
        std::thread::sleep(Duration::from_millis(300));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_errors_are_delivered() {
        let rt = runtime();
        let (mut loader, _) = loader(&rt);

        loader.request("broken.fake");
        let done = loader.wait(TIMEOUT).unwrap();
        assert!(matches!(done.result, Err(LoadError::Parse(_))));

        loader.request("hull.obj");
        let done = loader.wait(TIMEOUT).unwrap();
        assert!(matches!(done.result, Err(LoadError::UnsupportedFormat(ref ext)) if ext == "obj"));
    }

    #[test]
    fn test_preload_serves_without_parsing() {
        let rt = runtime();
        let (mut loader, source) = loader(&rt);
        loader.preload("demo.fake", SceneTemplate::new("demo"));
        loader.request("demo.fake");
        let done = loader.poll().unwrap();
        assert_eq!(done.result.unwrap().name, "demo");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
