//! Per-hull asset descriptors
//!
//! Each hull asset comes with name allowlists that drive the material
//! rules. The literal tables below are the built-in defaults. An
//! [`EngineConfig`](crate::EngineConfig) may replace them per hull.

use crate::model::BaseModelId;
use serde::{Deserialize, Serialize};

/// Material slots that make up the hull shell
pub const HULL_SLOTS: [&str; 2] = ["Hull_Top", "Hull_Bottom"];

/// Node names whose visibility follows the electric flag
pub const AUTO_MANAGED_NODES: [&str; 2] = ["Motor", "Battery"];

/// Name prefixes that mark depth-mask helpers (matched case-insensitively)
pub const DEPTH_MASK_PREFIXES: [&str; 2] = ["depthmask", "occluder"];

/// Name allowlists describing one hull asset
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Hull this descriptor applies to
    pub base: BaseModelId,
    /// Material slots treated as the hull shell
    pub hull_slots: Vec<String>,
    /// Meshes that take the material-type finish
    pub material_meshes: Vec<String>,
    /// Soft-deck pad meshes
    pub deck_meshes: Vec<String>,
    /// Accent strip meshes
    pub strip_meshes: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl ModelDescriptor {
    /// Built-in tables for a hull
    pub fn builtin(base: BaseModelId) -> Self {
        match base {
            BaseModelId::Lagoon => Self {
                base,
                hull_slots: names(&HULL_SLOTS),
                material_meshes: names(&[
                    "Console",
                    "Seat_Base",
                    "Rub_Rail",
                    "Transom",
                    "Deck_Liner",
                    "SoftDeck_Bow",
                ]),
                deck_meshes: names(&["SoftDeck_Bow", "SoftDeck_Stern", "SoftDeck_Cockpit"]),
                strip_meshes: names(&["SoftDeck_Strip_Port", "SoftDeck_Strip_Starboard"]),
            },
            BaseModelId::Tide => Self {
                base,
                hull_slots: names(&HULL_SLOTS),
                material_meshes: names(&[
                    "Console",
                    "Leaning_Post",
                    "Rub_Rail",
                    "Transom",
                    "Deck_Liner",
                    "Hardtop",
                ]),
                deck_meshes: names(&["SoftDeck_Main", "SoftDeck_Helm"]),
                strip_meshes: names(&["SoftDeck_Trim"]),
            },
        }
    }

    pub fn is_hull_slot(&self, material_name: &str) -> bool {
        self.hull_slots.iter().any(|s| s == material_name)
    }

    pub fn is_deck_mesh(&self, node_name: &str) -> bool {
        contains_ignore_case(&self.deck_meshes, node_name)
    }

    pub fn is_strip_mesh(&self, node_name: &str) -> bool {
        contains_ignore_case(&self.strip_meshes, node_name)
    }

    /// Material-type allowlist minus the accent meshes
    pub fn is_material_mesh(&self, node_name: &str) -> bool {
        self.material_meshes.iter().any(|m| m == node_name)
            && !self.is_deck_mesh(node_name)
            && !self.is_strip_mesh(node_name)
    }
}

fn contains_ignore_case(list: &[String], name: &str) -> bool {
    list.iter().any(|entry| entry.eq_ignore_ascii_case(name))
}

/// Whether a node name marks a depth-mask helper
pub fn is_depth_mask_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    DEPTH_MASK_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}
