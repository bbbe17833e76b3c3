//! Color rules for material slots

use super::{ConfigurationMapper, HullSlot};
use crate::configuration::Configuration;
use crate::model::HullColor;
use crate::scene::{MaterialId, MaterialPatch, SceneGraph, MIN_REFLECTIVITY};
use crate::settings::{MappingTables, VariantAppearance};
use indexmap::IndexMap;
use keel_core::Color;

/// Patch to apply to one material slot
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialChange {
    pub material: MaterialId,
    pub patch: MaterialPatch,
}

/// Accumulates patches per slot, later rules win field by field
#[derive(Default)]
struct PatchSet {
    patches: IndexMap<MaterialId, MaterialPatch>,
}

impl PatchSet {
    fn add(&mut self, material: MaterialId, patch: MaterialPatch) {
        let entry = self.patches.entry(material).or_default();
        *entry = entry.merged(patch);
    }
}

/// Compute the material changes for `config`
///
/// Rules in order: hull slots, material-type finish, soft-deck accents,
/// minimum reflectivity. Hull slots are never touched by the other color
/// rules. Every rule writes the same fields whatever the configuration, so
/// the result does not depend on what was applied before. Patches that
/// would not change a slot are dropped.
pub fn plan_materials(
    mapper: &ConfigurationMapper,
    scene: &SceneGraph,
    config: &Configuration,
    tables: &MappingTables,
) -> Vec<MaterialChange> {
    let mut set = PatchSet::default();
    let editable = |id: MaterialId| {
        !mapper.is_hull_material(id) && scene.material(id).is_some_and(|m| m.is_standard())
    };

    for slot in &mapper.hull {
        set.add(slot.material, hull_patch(config.hull_color, slot, tables));
    }

    let finish = config.material_type.finish();
    let finish_patch = MaterialPatch {
        color: Some(finish.color),
        metalness: Some(finish.metalness),
        roughness: Some(finish.roughness),
        opacity: Some(1.0),
        reflectivity: None,
    };
    for &node in &mapper.material_nodes {
        for &material in mapper.node_materials(scene, node) {
            if editable(material) {
                set.add(material, finish_patch);
            }
        }
    }

    let (deck, strip) = match config.soft_deck_color {
        Some(key) => {
            let (deck, strip) = key.colors();
            (Some(deck), Some(strip))
        }
        None => (None, None),
    };
    for (nodes, accent) in [(&mapper.deck_nodes, deck), (&mapper.strip_nodes, strip)] {
        for &node in nodes {
            for &material in mapper.node_materials(scene, node) {
                if !editable(material) {
                    continue;
                }
                // Without a key the authored color comes back
                let color = accent.or_else(|| mapper.accent_authored.get(material).copied());
                if let Some(color) = color {
                    set.add(material, MaterialPatch::color(color));
                }
            }
        }
    }

    for (id, material) in scene.materials() {
        if material.is_standard() && material.reflectivity.is_none() {
            set.add(
                id,
                MaterialPatch {
                    reflectivity: Some(MIN_REFLECTIVITY),
                    ..Default::default()
                },
            );
        }
    }

    set.patches
        .into_iter()
        .filter(|(id, patch)| scene.material(*id).is_some_and(|m| m.differs_from(patch)))
        .map(|(material, patch)| MaterialChange { material, patch })
        .collect()
}

/// Hull finish for one slot
///
/// A custom color wins outright. Otherwise a variant of the same name in
/// the slot's material collection, then the authored color (white only),
/// then the fixed fallback. Metalness and roughness are always written so
/// a variant's finish does not outlive the mode that chose it.
fn hull_patch(hull: HullColor, slot: &HullSlot, tables: &MappingTables) -> MaterialPatch {
    let patch = |color: Color, metalness: Option<f32>, roughness: Option<f32>| MaterialPatch {
        color: Some(color),
        metalness: Some(metalness.unwrap_or(slot.metalness)),
        roughness: Some(roughness.unwrap_or(slot.roughness)),
        ..Default::default()
    };

    let Some(variant_name) = hull.variant_name() else {
        return patch(hull.fallback(), None, None);
    };

    let variant = tables
        .collection_for_slot(&slot.name)
        .and_then(|c| c.variant(variant_name));
    match variant.map(|v| &v.appearance) {
        Some(VariantAppearance::Color {
            color,
            metalness,
            roughness,
        }) => patch(*color, *metalness, *roughness),
        _ if hull == HullColor::White => patch(slot.authored, None, None),
        _ => patch(hull.fallback(), None, None),
    }
}
