//! Engine configuration file (`keel.toml`)
//!
//! ```toml
//! [assets]
//! model_dir = "assets/models"
//! texture_dir = "assets/textures"
//! template_cache_size = 4
//!
//! [water]
//! normals_texture = "waternormals.png"
//!
//! [[models]]
//! base = "tide"
//! strip_meshes = ["SoftDeck_Trim", "SoftDeck_Trim_Aft"]
//! ```

use crate::descriptor::ModelDescriptor;
use crate::error::ConfigError;
use crate::model::BaseModelId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level engine configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub water: WaterConfig,
    /// Per-hull allowlist overrides
    #[serde(default)]
    pub models: Vec<ModelOverride>,
}

/// Asset locations
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AssetsConfig {
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    #[serde(default = "default_texture_dir")]
    pub texture_dir: PathBuf,
    /// Number of parsed hull templates kept in memory
    #[serde(default = "default_template_cache_size")]
    pub template_cache_size: usize,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("assets/models")
}

fn default_texture_dir() -> PathBuf {
    PathBuf::from("assets/textures")
}

fn default_template_cache_size() -> usize {
    4
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            texture_dir: default_texture_dir(),
            template_cache_size: default_template_cache_size(),
        }
    }
}

/// Water surface assets
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct WaterConfig {
    /// Normal map file name, resolved against `assets.texture_dir`
    #[serde(default)]
    pub normals_texture: Option<String>,
}

/// Replacement allowlists for one hull; unset lists keep the built-in ones
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ModelOverride {
    pub base: BaseModelId,
    #[serde(default)]
    pub hull_slots: Option<Vec<String>>,
    #[serde(default)]
    pub material_meshes: Option<Vec<String>>,
    #[serde(default)]
    pub deck_meshes: Option<Vec<String>>,
    #[serde(default)]
    pub strip_meshes: Option<Vec<String>>,
}

impl EngineConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: EngineConfig = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        // Relative asset directories are relative to the config file
        if let Some(dir) = path.parent() {
            config.assets.model_dir = resolve(dir, &config.assets.model_dir);
            config.assets.texture_dir = resolve(dir, &config.assets.texture_dir);
        }
        Ok(config)
    }

    /// Asset path of a hull
    pub fn model_path(&self, base: BaseModelId) -> PathBuf {
        self.assets.model_dir.join(base.asset_file_name())
    }

    /// Water normal map path, if configured
    pub fn water_normals_path(&self) -> Option<PathBuf> {
        self.water
            .normals_texture
            .as_ref()
            .map(|name| self.assets.texture_dir.join(name))
    }

    /// Effective descriptor of a hull: built-in tables with overrides applied
    pub fn descriptor(&self, base: BaseModelId) -> ModelDescriptor {
        let mut descriptor = ModelDescriptor::builtin(base);
        for o in self.models.iter().filter(|o| o.base == base) {
            if let Some(list) = &o.hull_slots {
                descriptor.hull_slots = list.clone();
            }
            if let Some(list) = &o.material_meshes {
                descriptor.material_meshes = list.clone();
            }
            if let Some(list) = &o.deck_meshes {
                descriptor.deck_meshes = list.clone();
            }
            if let Some(list) = &o.strip_meshes {
                descriptor.strip_meshes = list.clone();
            }
        }
        descriptor
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.assets.template_cache_size, 4);
        assert!(config.water_normals_path().is_none());
    }

    #[test]
    fn test_override_replaces_only_named_lists() {
        let config: EngineConfig = toml::from_str(
            r#"
            [[models]]
            base = "tide"
            strip_meshes = ["Trim_A", "Trim_B"]
            "#,
        )
        .unwrap();
        let tide = config.descriptor(BaseModelId::Tide);
        assert_eq!(tide.strip_meshes, vec!["Trim_A", "Trim_B"]);
        assert_eq!(tide.deck_meshes, ModelDescriptor::builtin(BaseModelId::Tide).deck_meshes);
        assert_eq!(config.descriptor(BaseModelId::Lagoon), ModelDescriptor::builtin(BaseModelId::Lagoon));
    }

    #[test]
    fn test_load_resolves_relative_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keel.toml");
        std::fs::write(
            &path,
            "[assets]\nmodel_dir = \"hulls\"\n[water]\nnormals_texture = \"n.png\"\n",
        )
        .unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.model_path(BaseModelId::Lagoon), dir.path().join("hulls").join("lagoon.glb"));
        assert_eq!(
            config.water_normals_path(),
            Some(dir.path().join("assets/textures").join("n.png"))
        );
    }

    #[test]
    fn test_load_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keel.toml");
        std::fs::write(&path, "[assets\n").unwrap();
        assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Toml { .. })));
        assert!(matches!(
            EngineConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
