//! Error types for keel_3d

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading scene assets or textures
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    /// Asset file does not exist
    #[error("Asset not found: {}", .0.display())]
    NotFound(PathBuf),

    /// IO error while reading the asset
    #[error("IO error reading {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// Asset could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// No loader handles this file extension
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        if err.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound(path)
        } else {
            LoadError::Io {
                path,
                message: err.to_string(),
            }
        }
    }
}

/// Errors from the external settings store
#[derive(Error, Debug)]
pub enum SettingsError {
    /// IO error when reading a settings document
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Settings document is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors loading the engine configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error when reading the file
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// TOML syntax or schema error
    #[error("Invalid config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors raised when mutating a [`Configuration`](crate::Configuration)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Option id is not part of the catalog
    #[error("Unknown option id: {0}")]
    UnknownOption(String),

    /// Custom hull color is not a valid hex string
    #[error(transparent)]
    InvalidColor(#[from] keel_core::ParseColorError),
}
