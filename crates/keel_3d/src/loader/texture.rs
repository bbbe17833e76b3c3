//! Texture loading, memoized per source

use crate::error::LoadError;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Decoded RGBA8 texture
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    /// Source the texture was loaded from
    pub source: String,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Decode an encoded image (PNG)
    pub fn decode(source: impl Into<String>, bytes: &[u8]) -> Result<Self, LoadError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| LoadError::Parse(e.to_string()))?
            .to_rgba8();
        Ok(Self {
            source: source.into(),
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        })
    }
}

/// Texture cache keyed by source path
///
/// Every source is read at most once. Failures are remembered as well, so
/// a missing texture is not retried every time a surface asks for it.
#[derive(Debug, Default)]
pub struct TextureCache {
    root: Option<PathBuf>,
    entries: FxHashMap<String, Result<Arc<TextureData>, LoadError>>,
    loads: u64,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative sources against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Default::default()
        }
    }

    /// Get a texture, loading it on first request
    pub fn get_or_load(&mut self, source: &str) -> Result<Arc<TextureData>, LoadError> {
        if let Some(entry) = self.entries.get(source) {
            return entry.clone();
        }

        let path = self.resolve(source);
        self.loads += 1;
        let result = std::fs::read(&path)
            .map_err(|e| LoadError::io(&path, e))
            .and_then(|bytes| TextureData::decode(source, &bytes))
            .map(Arc::new);

        match &result {
            Ok(texture) => tracing::debug!(
                source,
                width = texture.width,
                height = texture.height,
                "texture loaded"
            ),
            Err(err) => tracing::warn!(source, %err, "texture load failed"),
        }

        self.entries.insert(source.to_string(), result.clone());
        result
    }

    /// Put an already decoded texture in the cache
    pub fn insert(&mut self, texture: TextureData) -> Arc<TextureData> {
        let texture = Arc::new(texture);
        self.entries
            .insert(texture.source.clone(), Ok(Arc::clone(&texture)));
        texture
    }

    /// Number of times a source was actually read
    pub fn load_count(&self) -> u64 {
        self.loads
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
