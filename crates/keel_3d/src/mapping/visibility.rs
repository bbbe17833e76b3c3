//! Per-node visibility resolution

use crate::configuration::{Configuration, OptionCatalog};
use crate::descriptor::AUTO_MANAGED_NODES;
use crate::scene::{NodeId, SceneGraph};
use crate::settings::MappingTables;
use slotmap::SecondaryMap;

/// Visibility and shadow state a node should end up with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeChange {
    pub node: NodeId,
    pub visible: bool,
    pub cast_shadow: bool,
}

/// Whether `name` is one of the nodes that follow the electric flag
pub fn is_auto_managed(name: &str) -> bool {
    AUTO_MANAGED_NODES.iter().any(|n| n.eq_ignore_ascii_case(name))
}

/// Visibility a node asks for on its own, ignoring its ancestors
///
/// Auto-managed nodes follow the electric flag and ignore the tables.
/// Everything else is looked up by (name, base model): no mapping or a
/// mapping that is not hidden by default means visible; a hidden mapping
/// linked to an option is visible while that option is selected.
pub fn own_visibility(
    name: &str,
    config: &Configuration,
    tables: &MappingTables,
    catalog: &OptionCatalog,
) -> bool {
    if is_auto_managed(name) {
        return config.model.is_electric();
    }

    let Some(mapping) = tables.visibility_mapping(name, config.model.base()) else {
        return true;
    };
    if !mapping.hidden_by_default {
        return true;
    }

    match mapping.linked_option_id.as_deref() {
        Some(option) if !catalog.is_empty() && !catalog.contains(option) => {
            tracing::warn!(group = %name, option, "mapping linked to unknown option");
            false
        }
        Some(option) => config.is_selected(option),
        None => false,
    }
}

/// Compute the visibility changes for `config`
///
/// Walks the scene once in pre-order so a node is visible only if it and
/// every ancestor are. Meshes cast shadows only while visible, and
/// depth-mask helpers never do. Only nodes whose state differs from the
/// scene are returned.
pub fn plan_visibility(
    scene: &SceneGraph,
    config: &Configuration,
    tables: &MappingTables,
    catalog: &OptionCatalog,
) -> Vec<NodeChange> {
    let mut effective: SecondaryMap<NodeId, bool> = SecondaryMap::with_capacity(scene.node_count());
    let mut changes = Vec::new();

    for (id, node) in scene.nodes() {
        let parent_visible = node
            .parent
            .and_then(|p| effective.get(p).copied())
            .unwrap_or(true);
        let visible = parent_visible && own_visibility(&node.name, config, tables, catalog);
        effective.insert(id, visible);

        let cast_shadow = if node.is_mesh() {
            visible && node.authored_cast_shadow && !node.depth_mask
        } else {
            node.cast_shadow
        };

        if node.visible != visible || node.cast_shadow != cast_shadow {
            changes.push(NodeChange {
                node: id,
                visible,
                cast_shadow,
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BaseModelId, ModelId};
    use crate::scene::SceneTemplate;
    use crate::settings::VisibilityMapping;

    fn scene() -> SceneGraph {
        let mut b = SceneTemplate::builder("lagoon");
        let boat = b.group("Boat", None);
        b.mesh("Hull", Some(boat), &["Hull_Top"]);
        b.mesh("Motor", Some(boat), &["Metal"]);
        b.mesh("Battery", Some(boat), &["Metal"]);
        let bimini = b.group("Bimini", Some(boat));
        b.mesh("Bimini_Canvas", Some(bimini), &["Canvas"]);
        b.mesh("Bimini_Frame", Some(bimini), &["Metal"]);
        b.mesh("Cooler", Some(boat), &["Plastic"]);
        let mask = b.mesh("DepthMask_Hull", Some(boat), &["Hull_Top"]);
        b.depth_mask(mask);
        SceneGraph::instantiate(&b.build())
    }

    fn tables() -> MappingTables {
        let mut tables = MappingTables::new();
        for base in BaseModelId::ALL {
            tables.insert_group(VisibilityMapping::new("Bimini", base).linked_to("bimini"));
            tables.insert_group(VisibilityMapping::new("Cooler", base).hidden());
        }
        // Tables must never beat the electric rule
        tables.insert_group(VisibilityMapping::new("Motor", BaseModelId::Lagoon));
        tables
    }

    fn catalog() -> OptionCatalog {
        OptionCatalog::from_pairs([("bimini", "Bimini Top")])
    }

    fn resolve(scene: &mut SceneGraph, config: &Configuration) {
        for change in plan_visibility(scene, config, &tables(), &catalog()) {
            let node = scene.node_mut(change.node).unwrap();
            node.visible = change.visible;
            node.cast_shadow = change.cast_shadow;
        }
    }

    fn visible(scene: &SceneGraph, name: &str) -> bool {
        scene.node(scene.find_first(name).unwrap()).unwrap().visible
    }

    #[test]
    fn test_auto_managed_follow_electric_flag() {
        for model in ModelId::ALL {
            let mut scene = scene();
            resolve(&mut scene, &Configuration::new().with_model(model));
            assert_eq!(visible(&scene, "Motor"), model.is_electric(), "{model}");
            assert_eq!(visible(&scene, "Battery"), model.is_electric(), "{model}");
        }
    }

    #[test]
    fn test_electric_variant_shares_mappings() {
        let tables = tables();
        let catalog = catalog();
        let names = ["Hull", "Bimini", "Cooler", "Unmapped"];
        for (a, b) in [
            (ModelId::Lagoon, ModelId::LagoonElectric),
            (ModelId::Tide, ModelId::TideElectric),
        ] {
            for selected in [false, true] {
                let mut ca = Configuration::new().with_model(a);
                let mut cb = Configuration::new().with_model(b);
                if selected {
                    ca.selected_options.insert("bimini".into());
                    cb.selected_options.insert("bimini".into());
                }
                for name in names {
                    assert_eq!(
                        own_visibility(name, &ca, &tables, &catalog),
                        own_visibility(name, &cb, &tables, &catalog),
                        "{name} differs between {a} and {b}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_linked_option_toggles_only_its_subtree() {
        let catalog = catalog();
        let mut scene = scene();
        let mut config = Configuration::new();
        resolve(&mut scene, &config);
        assert!(!visible(&scene, "Bimini"));
        assert!(!visible(&scene, "Bimini_Canvas"));
        assert!(!visible(&scene, "Cooler"));

        config.toggle_option("bimini", &catalog).unwrap();
        let changes = plan_visibility(&scene, &config, &tables(), &catalog);
        let bimini = scene.find_first("Bimini").unwrap();
        let subtree = scene.subtree(bimini);
        assert_eq!(changes.len(), subtree.len());
        assert!(changes.iter().all(|c| subtree.contains(&c.node) && c.visible));
    }

    #[test]
    fn test_hidden_without_link_stays_hidden() {
        let mut scene = scene();
        let mut config = Configuration::new();
        config.selected_options.insert("Cooler".into());
        resolve(&mut scene, &config);
        assert!(!visible(&scene, "Cooler"));
    }

    #[test]
    fn test_hidden_meshes_drop_shadows() {
        let mut scene = scene();
        resolve(&mut scene, &Configuration::new());
        let canvas = scene.node(scene.find_first("Bimini_Canvas").unwrap()).unwrap();
        assert!(!canvas.cast_shadow);
        let hull = scene.node(scene.find_first("Hull").unwrap()).unwrap();
        assert!(hull.cast_shadow);
    }

    #[test]
    fn test_depth_mask_never_casts_shadow() {
        let mut scene = scene();
        for config in [Configuration::new(), Configuration::new().with_model(ModelId::TideElectric)] {
            resolve(&mut scene, &config);
            let mask = scene.node(scene.find_first("DepthMask_Hull").unwrap()).unwrap();
            assert!(mask.visible);
            assert!(!mask.cast_shadow);
        }
    }

    #[test]
    fn test_unknown_linked_option_is_hidden() {
        let mut tables = MappingTables::new();
        tables.insert_group(VisibilityMapping::new("Cooler", BaseModelId::Lagoon).linked_to("fridge"));
        let mut config = Configuration::new();
        config.selected_options.insert("fridge".into());
        assert!(!own_visibility("Cooler", &config, &tables, &catalog()));
        // Without a catalog the link is taken at face value
        assert!(own_visibility("Cooler", &config, &tables, &OptionCatalog::new()));
    }

    #[test]
    fn test_second_pass_is_empty() {
        let mut scene = scene();
        let config = Configuration::new();
        resolve(&mut scene, &config);
        assert!(plan_visibility(&scene, &config, &tables(), &catalog()).is_empty());
    }
}
