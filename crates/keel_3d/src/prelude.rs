//! Prelude module for common imports
//!
//! ```rust,ignore
//! use keel_3d::prelude::*;
//! ```

// Session
pub use crate::configurator::{Configurator, DrawItem, RenderFrame};
pub use crate::config::EngineConfig;

// Configuration
pub use crate::configuration::{Configuration, ConfigurationInput, OptionCatalog};
pub use crate::model::{BaseModelId, HullColor, MaterialType, ModelId, SoftDeckColor, WaveMode};

// Scene
pub use crate::scene::{Material, MaterialKind, NodeId, SceneGraph, SceneNode, SceneTemplate};

// Loading
pub use crate::loader::{SceneLoader, SceneSource, SourceRegistry};

// Settings
pub use crate::settings::{JsonDirSettings, MappingTables, SettingsKind, SettingsSource, StaticSettings};

// Camera
pub use crate::camera::{CameraTransform, InputController, OrbitBounds, OrbitController, PointerButton, PointerEvent};

// Errors
pub use crate::error::{ConfigError, ConfigurationError, LoadError, SettingsError};

// Core types
pub use keel_core::{BoundingBox, Color, Quat, Vec2, Vec3};
