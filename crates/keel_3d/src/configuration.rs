//! Customer configuration state and the option catalog

use crate::error::ConfigurationError;
use crate::model::{HullColor, MaterialType, ModelId, SoftDeckColor, WaveMode};
use indexmap::IndexMap;
use keel_core::Color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The abstract configuration the engine renders
///
/// Created with defaults and mutated in place for the lifetime of a
/// session. The orchestrator compares it against the last applied value to
/// decide whether an apply pass is needed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Configuration {
    pub model: ModelId,
    pub material_type: MaterialType,
    pub hull_color: HullColor,
    /// `None` leaves the accent meshes at their authored colors
    pub soft_deck_color: Option<SoftDeckColor>,
    pub selected_options: BTreeSet<String>,
    pub wave_mode: WaveMode,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = model;
        self
    }

    pub fn with_material_type(mut self, material_type: MaterialType) -> Self {
        self.material_type = material_type;
        self
    }

    pub fn with_hull_color(mut self, hull_color: HullColor) -> Self {
        self.hull_color = hull_color;
        self
    }

    pub fn with_soft_deck_color(mut self, color: SoftDeckColor) -> Self {
        self.soft_deck_color = Some(color);
        self
    }

    pub fn with_wave_mode(mut self, wave_mode: WaveMode) -> Self {
        self.wave_mode = wave_mode;
        self
    }

    /// Set a custom hull color from a hex string
    pub fn set_custom_hull_hex(&mut self, hex: &str) -> Result<(), ConfigurationError> {
        self.hull_color = HullColor::Custom(Color::parse_hex(hex)?);
        Ok(())
    }

    /// Select an option, rejecting ids the catalog does not know
    pub fn select_option(&mut self, id: &str, catalog: &OptionCatalog) -> Result<bool, ConfigurationError> {
        if !catalog.contains(id) {
            return Err(ConfigurationError::UnknownOption(id.to_string()));
        }
        Ok(self.selected_options.insert(id.to_string()))
    }

    pub fn deselect_option(&mut self, id: &str) -> bool {
        self.selected_options.remove(id)
    }

    /// Flip an option, returning whether it is selected afterwards
    pub fn toggle_option(&mut self, id: &str, catalog: &OptionCatalog) -> Result<bool, ConfigurationError> {
        if self.selected_options.contains(id) {
            self.selected_options.remove(id);
            Ok(false)
        } else {
            self.select_option(id, catalog)?;
            Ok(true)
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_options.contains(id)
    }
}

/// Wire form of a configuration as handed over by the storefront
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigurationInput {
    pub model_id: ModelId,
    pub material_type: MaterialType,
    pub hull_color_mode: String,
    pub hull_color_hex: Option<String>,
    pub soft_deck_color_key: Option<String>,
    pub selected_option_ids: Vec<String>,
    pub wave_mode: WaveMode,
}

impl From<ConfigurationInput> for Configuration {
    /// Unknown or inconsistent values fall back to defaults
    fn from(input: ConfigurationInput) -> Self {
        let hull_color = match input.hull_color_mode.trim().to_ascii_lowercase().as_str() {
            "grey" | "gray" => HullColor::Grey,
            "custom" => match input.hull_color_hex.as_deref().map(Color::parse_hex) {
                Some(Ok(color)) => HullColor::Custom(color),
                Some(Err(err)) => {
                    tracing::warn!(%err, "custom hull color rejected, using white");
                    HullColor::White
                }
                None => HullColor::White,
            },
            _ => HullColor::White,
        };

        Configuration {
            model: input.model_id,
            material_type: input.material_type,
            hull_color,
            soft_deck_color: input.soft_deck_color_key.as_deref().map(SoftDeckColor::from_key),
            selected_options: input.selected_option_ids.into_iter().collect(),
            wave_mode: input.wave_mode,
        }
    }
}

/// Selectable catalog options (id → display name)
///
/// Supplied by the catalog service. Used to populate the "link visibility to
/// option" selector and as the universe of ids a configuration may select.
#[derive(Clone, Debug, Default)]
pub struct OptionCatalog {
    options: IndexMap<String, String>,
}

impl OptionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            options: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.options.insert(id.into(), name.into());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.options.contains_key(id)
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.options.get(id).map(String::as_str)
    }

    /// Choices for the "link visibility to option" selector, catalog order
    pub fn link_choices(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> OptionCatalog {
        OptionCatalog::from_pairs([("bimini", "Bimini Top"), ("ladder", "Swim Ladder")])
    }

    #[test]
    fn test_select_rejects_unknown_option() {
        let mut config = Configuration::new();
        assert_eq!(
            config.select_option("jetpack", &catalog()),
            Err(ConfigurationError::UnknownOption("jetpack".into()))
        );
        assert!(config.selected_options.is_empty());
    }

    #[test]
    fn test_toggle_option() {
        let catalog = catalog();
        let mut config = Configuration::new();
        assert_eq!(config.toggle_option("ladder", &catalog), Ok(true));
        assert!(config.is_selected("ladder"));
        assert_eq!(config.toggle_option("ladder", &catalog), Ok(false));
        assert!(!config.is_selected("ladder"));
    }

    #[test]
    fn test_link_choices_keep_catalog_order() {
        let choices: Vec<_> = catalog().link_choices().map(|(id, _)| id.to_string()).collect();
        assert_eq!(choices, vec!["bimini", "ladder"]);
    }

    #[test]
    fn test_input_conversion() {
        let input: ConfigurationInput = serde_json::from_str(
            r##"{
                "modelId": "tide-electric",
                "materialType": "carbon",
                "hullColorMode": "custom",
                "hullColorHex": "#FF6B00",
                "softDeckColorKey": "Slate",
                "selectedOptionIds": ["bimini"],
                "waveMode": "dry-dock"
            }"##,
        )
        .unwrap();
        let config = Configuration::from(input);
        assert_eq!(config.model, ModelId::TideElectric);
        assert_eq!(config.material_type, MaterialType::Carbon);
        assert_eq!(config.hull_color, HullColor::Custom(Color::from_hex(0xFF6B00)));
        assert_eq!(config.soft_deck_color, Some(SoftDeckColor::Slate));
        assert!(config.is_selected("bimini"));
        assert_eq!(config.wave_mode, WaveMode::DryDock);
    }

    #[test]
    fn test_input_defaults_for_garbage() {
        let input: ConfigurationInput = serde_json::from_str(
            r#"{"hullColorMode": "custom", "hullColorHex": "nope", "waveMode": "storm"}"#,
        )
        .unwrap();
        let config = Configuration::from(input);
        assert_eq!(config.hull_color, HullColor::White);
        assert_eq!(config.wave_mode, WaveMode::Ocean);
        assert_eq!(config.model, ModelId::Lagoon);
    }
}
