//! Model identifiers and the enumerated configuration choices
//!
//! Two physical hulls (`lagoon`, `tide`) back four model ids: each hull has
//! an electric variant that shares its asset, mapping tables and material
//! tables. [`ModelId::base`] strips the electric suffix.

use keel_core::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix that marks the electric variant of a hull
pub const ELECTRIC_SUFFIX: &str = "-electric";

/// Supported model identifiers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelId {
    #[default]
    Lagoon,
    LagoonElectric,
    Tide,
    TideElectric,
}

impl ModelId {
    /// Every supported model id
    pub const ALL: [ModelId; 4] = [
        ModelId::Lagoon,
        ModelId::LagoonElectric,
        ModelId::Tide,
        ModelId::TideElectric,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Lagoon => "lagoon",
            ModelId::LagoonElectric => "lagoon-electric",
            ModelId::Tide => "tide",
            ModelId::TideElectric => "tide-electric",
        }
    }

    /// Parse a model id, `None` for ids outside the supported set
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    /// Whether this id denotes an electric variant
    pub fn is_electric(self) -> bool {
        matches!(self, ModelId::LagoonElectric | ModelId::TideElectric)
    }

    /// Hull identifier shared between a model and its electric variant
    pub fn base(self) -> BaseModelId {
        match self {
            ModelId::Lagoon | ModelId::LagoonElectric => BaseModelId::Lagoon,
            ModelId::Tide | ModelId::TideElectric => BaseModelId::Tide,
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ModelId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModelId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ModelId::parse(&raw).unwrap_or_else(|| {
            tracing::warn!(model = %raw, "unknown model id, using default");
            ModelId::default()
        }))
    }
}

/// Model id with the electric suffix removed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseModelId {
    Lagoon,
    Tide,
}

impl BaseModelId {
    pub const ALL: [BaseModelId; 2] = [BaseModelId::Lagoon, BaseModelId::Tide];

    pub fn as_str(self) -> &'static str {
        match self {
            BaseModelId::Lagoon => "lagoon",
            BaseModelId::Tide => "tide",
        }
    }

    /// Strip the electric suffix from an arbitrary id string
    ///
    /// Used for mapping rows coming from the settings store, which may be
    /// keyed by either variant.
    pub fn from_model_str(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        let base = s.strip_suffix(ELECTRIC_SUFFIX).unwrap_or(&s);
        Self::ALL.into_iter().find(|b| b.as_str() == base)
    }

    /// File name of the hull asset
    pub fn asset_file_name(self) -> String {
        format!("{}.glb", self.as_str())
    }
}

impl fmt::Display for BaseModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a lowercase enum value, falling back to the default for unknown input
macro_rules! lenient_enum_serde {
    ($ty:ty, $label:literal) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(<$ty>::parse(&raw).unwrap_or_else(|| {
                    tracing::warn!(value = %raw, kind = $label, "unknown enum value, using default");
                    <$ty>::default()
                }))
            }
        }
    };
}

/// Hull construction material
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaterialType {
    #[default]
    Fiberglass,
    Carbon,
}

impl MaterialType {
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialType::Fiberglass => "fiberglass",
            MaterialType::Carbon => "carbon",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fiberglass" => Some(MaterialType::Fiberglass),
            "carbon" => Some(MaterialType::Carbon),
            _ => None,
        }
    }

    /// Surface finish applied to material-type meshes
    pub fn finish(self) -> SurfaceFinish {
        match self {
            MaterialType::Fiberglass => SurfaceFinish {
                color: Color::from_hex(0xF4F4F0),
                metalness: 0.05,
                roughness: 0.35,
            },
            MaterialType::Carbon => SurfaceFinish {
                color: Color::from_hex(0x1E1F22),
                metalness: 0.4,
                roughness: 0.25,
            },
        }
    }
}

lenient_enum_serde!(MaterialType, "material type");

/// Color + metalness + roughness triple
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceFinish {
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
}

/// How the hull is colored
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum HullColor {
    #[default]
    White,
    Grey,
    /// Custom override, applied to both hull slots
    Custom(Color),
}

impl HullColor {
    /// Fixed fallback used when no snapshot or variant exists for the mode
    pub fn fallback(self) -> Color {
        match self {
            HullColor::White => Color::from_hex(0xFFFFFF),
            HullColor::Grey => Color::from_hex(0x8A8D91),
            HullColor::Custom(color) => color,
        }
    }

    /// Variant name looked up in hull material collections
    pub fn variant_name(self) -> Option<&'static str> {
        match self {
            HullColor::White => Some("white"),
            HullColor::Grey => Some("grey"),
            HullColor::Custom(_) => None,
        }
    }
}

/// Soft-deck / strip accent palette key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SoftDeckColor {
    #[default]
    Sand,
    Slate,
    Ocean,
}

impl SoftDeckColor {
    pub const ALL: [SoftDeckColor; 3] = [SoftDeckColor::Sand, SoftDeckColor::Slate, SoftDeckColor::Ocean];

    pub fn as_str(self) -> &'static str {
        match self {
            SoftDeckColor::Sand => "sand",
            SoftDeckColor::Slate => "slate",
            SoftDeckColor::Ocean => "ocean",
        }
    }

    /// Case-insensitive key match; unknown keys resolve to the first pair
    pub fn from_key(key: &str) -> Self {
        Self::parse(key).unwrap_or(Self::ALL[0])
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(key.trim()))
    }

    /// (deck, strip) color pair
    pub fn colors(self) -> (Color, Color) {
        match self {
            SoftDeckColor::Sand => (Color::from_hex(0xD8C7A3), Color::from_hex(0x8C7A5B)),
            SoftDeckColor::Slate => (Color::from_hex(0x5F6670), Color::from_hex(0x2E3238)),
            SoftDeckColor::Ocean => (Color::from_hex(0x2D5D7B), Color::from_hex(0xA9C6D8)),
        }
    }
}

impl Serialize for SoftDeckColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SoftDeckColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SoftDeckColor::from_key(&raw))
    }
}

/// Viewing mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaveMode {
    /// Animated water, idle boat motion
    #[default]
    Ocean,
    /// Boat on stands, no water
    DryDock,
}

impl WaveMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WaveMode::Ocean => "ocean",
            WaveMode::DryDock => "dry-dock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ocean" => Some(WaveMode::Ocean),
            "dry-dock" | "drydock" | "dry_dock" => Some(WaveMode::DryDock),
            _ => None,
        }
    }
}

lenient_enum_serde!(WaveMode, "wave mode");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_strips_electric_suffix() {
        assert_eq!(ModelId::LagoonElectric.base(), ModelId::Lagoon.base());
        assert_eq!(ModelId::TideElectric.base(), BaseModelId::Tide);
        assert_eq!(BaseModelId::from_model_str("Tide-Electric"), Some(BaseModelId::Tide));
        assert_eq!(BaseModelId::from_model_str("lagoon"), Some(BaseModelId::Lagoon));
        assert_eq!(BaseModelId::from_model_str("canoe"), None);
    }

    #[test]
    fn test_electric_flag() {
        for model in ModelId::ALL {
            assert_eq!(model.is_electric(), model.as_str().ends_with(ELECTRIC_SUFFIX));
        }
    }

    #[test]
    fn test_two_assets_back_four_models() {
        let mut files: Vec<String> = ModelId::ALL.iter().map(|m| m.base().asset_file_name()).collect();
        files.dedup();
        assert_eq!(files, vec!["lagoon.glb".to_string(), "tide.glb".to_string()]);
    }

    #[test]
    fn test_soft_deck_key_matching() {
        assert_eq!(SoftDeckColor::from_key("SLATE"), SoftDeckColor::Slate);
        assert_eq!(SoftDeckColor::from_key(" ocean "), SoftDeckColor::Ocean);
        assert_eq!(SoftDeckColor::from_key("neon"), SoftDeckColor::Sand);
        assert_eq!(SoftDeckColor::from_key("neon").colors(), SoftDeckColor::ALL[0].colors());
    }

    #[test]
    fn test_soft_deck_pairs_are_distinct() {
        let pairs: Vec<_> = SoftDeckColor::ALL.iter().map(|c| c.colors()).collect();
        assert_ne!(pairs[0], pairs[1]);
        assert_ne!(pairs[1], pairs[2]);
        assert_ne!(pairs[0], pairs[2]);
    }

    #[test]
    fn test_unknown_enum_values_use_default() {
        let wave: WaveMode = serde_json::from_str("\"tsunami\"").unwrap();
        assert_eq!(wave, WaveMode::Ocean);
        let material: MaterialType = serde_json::from_str("\"wood\"").unwrap();
        assert_eq!(material, MaterialType::Fiberglass);
        let model: ModelId = serde_json::from_str("\"canoe\"").unwrap();
        assert_eq!(model, ModelId::Lagoon);
        let wave: WaveMode = serde_json::from_str("\"dry-dock\"").unwrap();
        assert_eq!(wave, WaveMode::DryDock);
    }
}
