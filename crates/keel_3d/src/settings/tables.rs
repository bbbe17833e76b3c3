//! Visibility mappings and material variant collections

use crate::model::BaseModelId;
use crate::scene::TextureRef;
use keel_core::Color;
use serde::Deserialize;
use serde_json::Value;

/// Visibility rule for one named group on one hull
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibilityMapping {
    pub group_name: String,
    pub base: BaseModelId,
    pub hidden_by_default: bool,
    pub linked_option_id: Option<String>,
}

impl VisibilityMapping {
    pub fn new(group_name: impl Into<String>, base: BaseModelId) -> Self {
        Self {
            group_name: group_name.into(),
            base,
            hidden_by_default: false,
            linked_option_id: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden_by_default = true;
        self
    }

    pub fn linked_to(mut self, option_id: impl Into<String>) -> Self {
        self.hidden_by_default = true;
        self.linked_option_id = Some(option_id.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupRow {
    group_name: String,
    model_id: String,
    #[serde(default)]
    hidden_by_default: bool,
    #[serde(default)]
    linked_option_id: Option<String>,
}

/// Parse `groups` rows, skipping rows that cannot be understood
pub(crate) fn parse_group_rows(rows: &[Value]) -> Vec<VisibilityMapping> {
    rows.iter()
        .filter_map(|row| {
            let parsed: GroupRow = match serde_json::from_value(row.clone()) {
                Ok(parsed) => parsed,
                Err(err) => {
                    tracing::warn!(%err, "skipping malformed group mapping");
                    return None;
                }
            };
            let Some(base) = BaseModelId::from_model_str(&parsed.model_id) else {
                tracing::warn!(model = %parsed.model_id, group = %parsed.group_name, "group mapping for unknown model");
                return None;
            };
            Some(VisibilityMapping {
                group_name: parsed.group_name,
                base,
                hidden_by_default: parsed.hidden_by_default,
                linked_option_id: parsed.linked_option_id.filter(|id| !id.is_empty()),
            })
        })
        .collect()
}

/// What a material variant looks like
#[derive(Clone, Debug, PartialEq)]
pub enum VariantAppearance {
    Color {
        color: Color,
        metalness: Option<f32>,
        roughness: Option<f32>,
    },
    Texture(TextureRef),
}

/// One selectable look of a material collection
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialVariant {
    pub name: String,
    pub appearance: VariantAppearance,
}

impl MaterialVariant {
    pub fn color(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            appearance: VariantAppearance::Color {
                color,
                metalness: None,
                roughness: None,
            },
        }
    }
}

/// Ordered variants governing a set of material slots
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialVariantCollection {
    pub id: String,
    /// Material slot names this collection governs
    pub targets: Vec<String>,
    pub variants: Vec<MaterialVariant>,
}

impl MaterialVariantCollection {
    /// Collection governing the slot of the same name
    pub fn for_slot(slot: impl Into<String>) -> Self {
        let slot = slot.into();
        Self {
            id: slot.clone(),
            targets: vec![slot],
            variants: Vec::new(),
        }
    }

    pub fn with_variant(mut self, variant: MaterialVariant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Variant lookup by name, case-insensitive
    pub fn variant(&self, name: &str) -> Option<&MaterialVariant> {
        self.variants.iter().find(|v| v.name.eq_ignore_ascii_case(name))
    }

    pub fn governs(&self, slot: &str) -> bool {
        self.targets.iter().any(|t| t == slot)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaterialRow {
    material_name: String,
    #[serde(default)]
    targets: Option<Vec<String>>,
    #[serde(default)]
    variants: Vec<Value>,
}

#[derive(Deserialize)]
struct VariantRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    hex: Option<String>,
    #[serde(default)]
    metalness: Option<f32>,
    #[serde(default)]
    roughness: Option<f32>,
    #[serde(default)]
    texture: Option<String>,
}

/// Parse `materials` rows; a row without `variants` yields an empty collection
pub(crate) fn parse_material_rows(rows: &[Value]) -> Vec<MaterialVariantCollection> {
    rows.iter()
        .filter_map(|row| {
            let parsed: MaterialRow = match serde_json::from_value(row.clone()) {
                Ok(parsed) => parsed,
                Err(err) => {
                    tracing::warn!(%err, "skipping malformed material collection");
                    return None;
                }
            };
            let variants = parsed.variants.iter().filter_map(parse_variant).collect();
            Some(MaterialVariantCollection {
                targets: parsed.targets.unwrap_or_else(|| vec![parsed.material_name.clone()]),
                id: parsed.material_name,
                variants,
            })
        })
        .collect()
}

fn parse_variant(value: &Value) -> Option<MaterialVariant> {
    let row: VariantRow = serde_json::from_value(value.clone()).ok()?;
    let appearance = match (row.hex.as_deref().map(Color::parse_hex), row.texture) {
        (Some(Ok(color)), _) => VariantAppearance::Color {
            color,
            metalness: row.metalness,
            roughness: row.roughness,
        },
        (_, Some(source)) => VariantAppearance::Texture(TextureRef { source }),
        (Some(Err(err)), None) => {
            tracing::warn!(variant = %row.name, %err, "skipping variant with bad color");
            return None;
        }
        (None, None) => return None,
    };
    Some(MaterialVariant {
        name: row.name,
        appearance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_rows_share_base_model() {
        let rows = vec![
            json!({ "groupName": "Bimini", "modelId": "lagoon-electric", "hiddenByDefault": true, "linkedOptionId": "bimini" }),
            json!({ "groupName": "Ladder", "modelId": "tide" }),
        ];
        let mappings = parse_group_rows(&rows);
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].base, BaseModelId::Lagoon);
        assert_eq!(mappings[0].linked_option_id.as_deref(), Some("bimini"));
        assert!(!mappings[1].hidden_by_default);
    }

    #[test]
    fn test_bad_group_rows_are_skipped() {
        let rows = vec![
            json!({ "modelId": "lagoon" }),
            json!({ "groupName": "X", "modelId": "submarine" }),
            json!("garbage"),
            json!({ "groupName": "Rails", "modelId": "tide", "linkedOptionId": "" }),
        ];
        let mappings = parse_group_rows(&rows);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].linked_option_id, None);
    }

    #[test]
    fn test_material_rows() {
        let rows = vec![
            json!({ "materialName": "Hull_Top", "variants": [
                { "name": "grey", "hex": "#777777" },
                { "name": "teak", "texture": "teak.png" },
                { "name": "broken", "hex": "zz" }
            ]}),
            json!({ "materialName": "Console" }),
        ];
        let collections = parse_material_rows(&rows);
        assert_eq!(collections.len(), 2);
        assert_eq!(collections[0].variants.len(), 2);
        assert!(collections[0].governs("Hull_Top"));
        assert!(collections[0].variant("GREY").is_some());
        assert!(collections[1].variants.is_empty());
    }
}
