//! # Keel 3D
//!
//! Real-time 3D engine behind the Keel boat configurator.
//!
//! This crate provides:
//! - **Scene loading** of hull assets, off the frame thread, with a template cache
//! - **Configuration mapping** from a [`Configuration`] onto node visibility and materials
//! - **Remote mapping tables** for option-linked groups, material variants and environment
//! - **Orbit camera** with per-mode bounds and a gesture state machine
//! - **Water and motion** for the ocean and dry-dock presentations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keel_3d::prelude::*;
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let tables = MappingTables::fetch(&JsonDirSettings::new("settings"));
//! let mut configurator = Configurator::new(
//!     EngineConfig::default(),
//!     tables,
//!     OptionCatalog::new(),
//!     runtime.handle().clone(),
//! );
//! configurator.configuration_mut().wave_mode = WaveMode::DryDock;
//! let frame = configurator.frame(1.0 / 60.0);
//! ```

// Engine configuration file
pub mod config;

// Configuration model
pub mod configuration;
pub mod descriptor;
pub mod model;

// Scene graph and materials
pub mod scene;

// Asset loading
pub mod loader;

// Remote mapping tables
pub mod settings;

// Configuration to scene mapping
pub mod mapping;

// Camera and input
pub mod camera;

// Environment
pub mod motion;
pub mod water;

// Session orchestration
pub mod configurator;

pub mod error;

// Prelude for common imports
pub mod prelude;

// Re-export core types at crate root
pub use config::{AssetsConfig, EngineConfig, ModelOverride, WaterConfig};
pub use configuration::{Configuration, ConfigurationInput, OptionCatalog};
pub use configurator::{Configurator, DrawItem, RenderFrame};
pub use descriptor::ModelDescriptor;
pub use error::{ConfigError, ConfigurationError, LoadError, SettingsError};
pub use mapping::{ApplyPlan, ConfigurationMapper};
pub use model::{BaseModelId, HullColor, MaterialType, ModelId, SoftDeckColor, WaveMode};
pub use scene::{SceneGraph, SceneTemplate};
pub use settings::MappingTables;
