//! Configuration → scene mapping
//!
//! The apply pass is split in two: [`ConfigurationMapper::plan`] reads the
//! scene and produces an [`ApplyPlan`] holding only the node and material
//! changes the configuration calls for; [`ConfigurationMapper::apply`]
//! writes that plan into the scene. The orchestrator runs both once per
//! configuration change, before the next frame is built.

mod materials;
mod visibility;

pub use materials::{plan_materials, MaterialChange};
pub use visibility::{is_auto_managed, own_visibility, plan_visibility, NodeChange};

use crate::configuration::{Configuration, OptionCatalog};
use crate::descriptor::{is_depth_mask_name, ModelDescriptor};
use crate::scene::{Material, MaterialId, NodeId, SceneGraph, DEPTH_MASK_RENDER_ORDER};
use crate::settings::MappingTables;
use keel_core::Color;
use slotmap::SecondaryMap;
use smallvec::SmallVec;

/// Name of the shared replacement material for depth-mask nodes
pub const DEPTH_MASK_MATERIAL: &str = "__keel_depth_mask";

/// One hull material with its authored finish
///
/// A slot name may resolve to several materials; each gets its own entry.
#[derive(Clone, Debug)]
pub(crate) struct HullSlot {
    pub name: String,
    pub material: MaterialId,
    pub authored: Color,
    pub metalness: f32,
    pub roughness: f32,
}

/// Changes to bring a scene in line with a configuration
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApplyPlan {
    pub nodes: Vec<NodeChange>,
    pub materials: Vec<MaterialChange>,
}

impl ApplyPlan {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.materials.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.materials.len()
    }
}

/// Per-scene index of the names the color rules care about
///
/// Built once right after a scene is instantiated. Building it also
/// captures the hull's authored colors and installs the depth-mask
/// material, so it must run before the first apply.
#[derive(Clone, Debug)]
pub struct ConfigurationMapper {
    descriptor: ModelDescriptor,
    pub(crate) hull: SmallVec<[HullSlot; 2]>,
    pub(crate) material_nodes: Vec<NodeId>,
    pub(crate) deck_nodes: Vec<NodeId>,
    pub(crate) strip_nodes: Vec<NodeId>,
    /// Authored colors of deck and strip materials, restored without a soft-deck key
    pub(crate) accent_authored: SecondaryMap<MaterialId, Color>,
    mask_material: Option<MaterialId>,
    mask_nodes: usize,
}

impl ConfigurationMapper {
    pub fn new(scene: &mut SceneGraph, descriptor: ModelDescriptor) -> Self {
        let hull = descriptor
            .hull_slots
            .iter()
            .flat_map(|name| scene.find_materials(name).iter().map(move |&id| (name, id)))
            .filter_map(|(name, material)| {
                let authored = scene.material(material)?;
                Some(HullSlot {
                    name: name.clone(),
                    material,
                    authored: authored.color,
                    metalness: authored.metalness,
                    roughness: authored.roughness,
                })
            })
            .collect();

        let mut material_nodes = Vec::new();
        let mut deck_nodes = Vec::new();
        let mut strip_nodes = Vec::new();
        for (id, node) in scene.nodes() {
            if !node.is_mesh() {
                continue;
            }
            if descriptor.is_deck_mesh(&node.name) {
                deck_nodes.push(id);
            } else if descriptor.is_strip_mesh(&node.name) {
                strip_nodes.push(id);
            } else if descriptor.is_material_mesh(&node.name) {
                material_nodes.push(id);
            }
        }

        let mut mapper = Self {
            descriptor,
            hull,
            material_nodes,
            deck_nodes,
            strip_nodes,
            accent_authored: SecondaryMap::new(),
            mask_material: None,
            mask_nodes: 0,
        };
        mapper.install_depth_masks(scene);
        mapper.capture_accents(scene);

        tracing::debug!(
            scene = %scene.name(),
            hull_slots = mapper.hull.len(),
            material_meshes = mapper.material_nodes.len(),
            deck_meshes = mapper.deck_nodes.len(),
            strip_meshes = mapper.strip_nodes.len(),
            depth_masks = mapper.mask_nodes,
            "scene indexed"
        );
        mapper
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    /// Shared depth-mask material, if the scene has any mask nodes
    pub fn mask_material(&self) -> Option<MaterialId> {
        self.mask_material
    }

    pub fn depth_mask_count(&self) -> usize {
        self.mask_nodes
    }

    pub(crate) fn is_hull_material(&self, id: MaterialId) -> bool {
        self.hull.iter().any(|h| h.material == id)
    }

    pub(crate) fn node_materials<'a>(&self, scene: &'a SceneGraph, node: NodeId) -> &'a [MaterialId] {
        scene.node(node).map(|n| n.materials.as_slice()).unwrap_or(&[])
    }

    fn capture_accents(&mut self, scene: &SceneGraph) {
        for &node in self.deck_nodes.iter().chain(&self.strip_nodes) {
            let Some(node) = scene.node(node) else { continue };
            for &id in &node.materials {
                if let Some(material) = scene.material(id).filter(|m| m.is_standard()) {
                    self.accent_authored.insert(id, material.color);
                }
            }
        }
    }

    /// Flag mask nodes and swap their materials for the depth-only one
    ///
    /// A node is a mask if the asset marks it or its name carries a mask
    /// prefix. Everything below a mask node is a mask too.
    fn install_depth_masks(&mut self, scene: &mut SceneGraph) {
        let roots: Vec<NodeId> = scene
            .nodes()
            .filter(|(_, n)| n.depth_mask || is_depth_mask_name(&n.name))
            .map(|(id, _)| id)
            .collect();
        if roots.is_empty() {
            return;
        }

        let mask = scene.add_material(Material::depth_mask(DEPTH_MASK_MATERIAL));
        self.mask_material = Some(mask);

        for root in roots {
            for id in scene.subtree(root) {
                let Some(node) = scene.node_mut(id) else { continue };
                if node.depth_mask && node.render_order == DEPTH_MASK_RENDER_ORDER {
                    continue;
                }
                node.depth_mask = true;
                node.cast_shadow = false;
                node.render_order = DEPTH_MASK_RENDER_ORDER;
                for slot in node.materials.iter_mut() {
                    *slot = mask;
                }
                self.mask_nodes += 1;
            }
        }
    }

    /// Compute the changes `config` requires
    pub fn plan(
        &self,
        scene: &SceneGraph,
        config: &Configuration,
        tables: &MappingTables,
        catalog: &OptionCatalog,
    ) -> ApplyPlan {
        ApplyPlan {
            nodes: plan_visibility(scene, config, tables, catalog),
            materials: plan_materials(self, scene, config, tables),
        }
    }

    /// Write a plan into the scene, returning the number of changes made
    pub fn apply(&self, scene: &mut SceneGraph, plan: &ApplyPlan) -> usize {
        let mut changed = 0;
        for change in &plan.nodes {
            if let Some(node) = scene.node_mut(change.node) {
                node.visible = change.visible;
                node.cast_shadow = change.cast_shadow;
                changed += 1;
            }
        }
        for change in &plan.materials {
            if let Some(material) = scene.material_mut(change.material) {
                if material.apply(&change.patch) {
                    changed += 1;
                }
            }
        }
        tracing::debug!(
            nodes = plan.nodes.len(),
            materials = plan.materials.len(),
            changed,
            "configuration applied"
        );
        changed
    }

    /// Plan and apply in one go
    pub fn apply_configuration(
        &self,
        scene: &mut SceneGraph,
        config: &Configuration,
        tables: &MappingTables,
        catalog: &OptionCatalog,
    ) -> ApplyPlan {
        let plan = self.plan(scene, config, tables, catalog);
        self.apply(scene, &plan);
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BaseModelId, HullColor, MaterialType, SoftDeckColor};
    use crate::scene::{MaterialKind, SceneTemplate, MIN_REFLECTIVITY};
    use crate::settings::{MaterialVariant, MaterialVariantCollection, VariantAppearance};
    use std::collections::BTreeMap;

    const AUTHORED_HULL: u32 = 0xFDFDFB;
    const AUTHORED_DECK: u32 = 0x123456;

    fn lagoon() -> SceneGraph {
        let mut b = SceneTemplate::builder("lagoon");
        let boat = b.group("Boat", None);
        b.mesh("Hull", Some(boat), &["Hull_Top", "Hull_Bottom"]);
        b.mesh("Console", Some(boat), &["Console_Paint"]);
        b.mesh("Seat_Base", Some(boat), &["Seat_Paint"]);
        b.mesh("SoftDeck_Bow", Some(boat), &["Deck_Foam_Bow"]);
        b.mesh("softdeck_stern", Some(boat), &["Deck_Foam_Stern"]);
        b.mesh("SoftDeck_Strip_Port", Some(boat), &["Strip_Foam"]);
        b.mesh("Windshield", Some(boat), &["Glass"]);
        let occluders = b.group("Occluders", Some(boat));
        b.mesh("Mask_A", Some(occluders), &["Hull_Top"]);
        b.material_color("Hull_Top", Color::from_hex(AUTHORED_HULL));
        b.material_color("Hull_Bottom", Color::from_hex(AUTHORED_HULL));
        b.material_color("Deck_Foam_Bow", Color::from_hex(AUTHORED_DECK));
        b.material_reflectivity("Glass", 0.9);
        SceneGraph::instantiate(&b.build())
    }

    fn setup() -> (SceneGraph, ConfigurationMapper) {
        let mut scene = lagoon();
        let mapper = ConfigurationMapper::new(&mut scene, ModelDescriptor::builtin(BaseModelId::Lagoon));
        (scene, mapper)
    }

    fn run(scene: &mut SceneGraph, mapper: &ConfigurationMapper, config: &Configuration, tables: &MappingTables) {
        mapper.apply_configuration(scene, config, tables, &OptionCatalog::new());
    }

    fn color_of(scene: &SceneGraph, material: &str) -> Color {
        scene.material(scene.find_material(material).unwrap()).unwrap().color
    }

    fn colors(scene: &SceneGraph) -> BTreeMap<String, Color> {
        scene.materials().map(|(_, m)| (m.name.clone(), m.color)).collect()
    }

    fn snapshot(scene: &SceneGraph) -> BTreeMap<String, Material> {
        scene.materials().map(|(_, m)| (m.name.clone(), m.clone())).collect()
    }

    #[test]
    fn test_material_type_finish() {
        let (mut scene, mapper) = setup();
        let tables = MappingTables::new();
        run(&mut scene, &mapper, &Configuration::new().with_material_type(MaterialType::Carbon), &tables);

        let console = scene.material(scene.find_material("Console_Paint").unwrap()).unwrap();
        let carbon = MaterialType::Carbon.finish();
        assert_eq!(console.color, carbon.color);
        assert_eq!(console.metalness, carbon.metalness);
        assert_eq!(console.roughness, carbon.roughness);
        assert_eq!(console.opacity, 1.0);
        assert_eq!(color_of(&scene, "Seat_Paint"), carbon.color);
        assert_eq!(color_of(&scene, "Glass"), Color::WHITE);
    }

    #[test]
    fn test_accents_excluded_from_material_type() {
        let (mut scene, mapper) = setup();
        let tables = MappingTables::new();
        let config = Configuration::new()
            .with_material_type(MaterialType::Carbon)
            .with_soft_deck_color(SoftDeckColor::Ocean);
        run(&mut scene, &mapper, &config, &tables);

        let (deck, strip) = SoftDeckColor::Ocean.colors();
        assert_eq!(color_of(&scene, "Deck_Foam_Bow"), deck);
        assert_eq!(color_of(&scene, "Deck_Foam_Stern"), deck);
        assert_eq!(color_of(&scene, "Strip_Foam"), strip);
        let bow = scene.material(scene.find_material("Deck_Foam_Bow").unwrap()).unwrap();
        assert_ne!(bow.metalness, MaterialType::Carbon.finish().metalness);
    }

    #[test]
    fn test_no_soft_deck_key_leaves_accents_authored() {
        let (mut scene, mapper) = setup();
        run(&mut scene, &mapper, &Configuration::new(), &MappingTables::new());
        assert_eq!(color_of(&scene, "Deck_Foam_Bow"), Color::from_hex(AUTHORED_DECK));
    }

    #[test]
    fn test_clearing_soft_deck_key_restores_authored_accents() {
        let tables = MappingTables::new();
        let (mut fresh, mapper) = setup();
        run(&mut fresh, &mapper, &Configuration::new(), &tables);

        let (mut scene, mapper) = setup();
        run(&mut scene, &mapper, &Configuration::new().with_soft_deck_color(SoftDeckColor::Ocean), &tables);
        assert_eq!(color_of(&scene, "Deck_Foam_Bow"), SoftDeckColor::Ocean.colors().0);
        run(&mut scene, &mapper, &Configuration::new(), &tables);

        assert_eq!(color_of(&scene, "Deck_Foam_Bow"), Color::from_hex(AUTHORED_DECK));
        assert_eq!(color_of(&scene, "Strip_Foam"), Color::WHITE);
        assert_eq!(snapshot(&scene), snapshot(&fresh));
    }

    #[test]
    fn test_hull_variant_finish_does_not_outlive_mode() {
        let mut tables = MappingTables::new();
        tables.insert_collection(MaterialVariantCollection::for_slot("Hull_Top").with_variant(MaterialVariant {
            name: "grey".into(),
            appearance: VariantAppearance::Color {
                color: Color::from_hex(0x606060),
                metalness: Some(0.9),
                roughness: Some(0.1),
            },
        }));
        let (mut fresh, mapper) = setup();
        run(&mut fresh, &mapper, &Configuration::new(), &tables);

        let (mut scene, mapper) = setup();
        let top = scene.find_material("Hull_Top").unwrap();
        run(&mut scene, &mapper, &Configuration::new(), &tables);
        run(&mut scene, &mapper, &Configuration::new().with_hull_color(HullColor::Grey), &tables);
        assert_eq!(scene.material(top).unwrap().metalness, 0.9);
        assert_eq!(scene.material(top).unwrap().roughness, 0.1);

        run(&mut scene, &mapper, &Configuration::new(), &tables);
        assert_eq!(snapshot(&scene), snapshot(&fresh));

        run(&mut scene, &mapper, &Configuration::new().with_hull_color(HullColor::Grey), &tables);
        run(&mut scene, &mapper, &Configuration::new().with_hull_color(HullColor::Custom(Color::BLACK)), &tables);
        let custom = scene.material(top).unwrap();
        assert_eq!(custom.metalness, fresh.material(fresh.find_material("Hull_Top").unwrap()).unwrap().metalness);
    }

    #[test]
    fn test_duplicate_hull_slot_names_all_recolored() {
        let mut b = SceneTemplate::builder("split");
        let boat = b.group("Boat", None);
        b.mesh("Hull", Some(boat), &["Hull_Top", "Hull_Bottom"]);
        b.mesh("Hull_Split", Some(boat), &["Hull_Split_Part"]);
        let mut template = b.build();
        // Exporter emitted the split primitive's material under the slot name
        let split = template.materials.iter().position(|m| m.name == "Hull_Split_Part").unwrap();
        template.materials[split].name = "Hull_Top".into();

        let mut scene = SceneGraph::instantiate(&template);
        let mapper = ConfigurationMapper::new(&mut scene, ModelDescriptor::builtin(BaseModelId::Lagoon));
        let mut config = Configuration::new();
        config.set_custom_hull_hex("#FF6B00").unwrap();
        run(&mut scene, &mapper, &config, &MappingTables::new());

        let tops = scene.find_materials("Hull_Top");
        assert_eq!(tops.len(), 2);
        for &id in tops {
            assert_eq!(scene.material(id).unwrap().color, Color::from_hex(0xFF6B00));
        }
    }

    #[test]
    fn test_custom_hull_changes_only_hull_slots() {
        let (mut scene, mapper) = setup();
        let tables = MappingTables::new();
        let mut config = Configuration::new();
        run(&mut scene, &mapper, &config, &tables);
        let before = colors(&scene);

        config.set_custom_hull_hex("#FF6B00").unwrap();
        let plan = mapper.plan(&scene, &config, &tables, &OptionCatalog::new());
        assert!(plan.nodes.is_empty());
        assert_eq!(plan.materials.len(), 2);
        mapper.apply(&mut scene, &plan);

        let after = colors(&scene);
        for (name, color) in &after {
            if name == "Hull_Top" || name == "Hull_Bottom" {
                assert_eq!(*color, Color::from_hex(0xFF6B00), "{name}");
            } else {
                assert_eq!(Some(color), before.get(name), "{name} changed");
            }
        }
        assert_eq!(color_of(&scene, "Console_Paint"), MaterialType::Fiberglass.finish().color);
    }

    #[test]
    fn test_hull_mode_stable_across_material_toggles() {
        let (mut scene, mapper) = setup();
        let tables = MappingTables::new();
        let mut config = Configuration::new().with_hull_color(HullColor::Grey);
        for material in [MaterialType::Carbon, MaterialType::Fiberglass, MaterialType::Carbon] {
            config.material_type = material;
            run(&mut scene, &mapper, &config, &tables);
            assert_eq!(color_of(&scene, "Hull_Top"), HullColor::Grey.fallback());
        }

        config.hull_color = HullColor::White;
        let plan = mapper.plan(&scene, &config, &tables, &OptionCatalog::new());
        assert_eq!(plan.materials.len(), 2);
        mapper.apply(&mut scene, &plan);
        assert_eq!(color_of(&scene, "Hull_Top"), Color::from_hex(AUTHORED_HULL));
        assert_eq!(color_of(&scene, "Hull_Bottom"), Color::from_hex(AUTHORED_HULL));
    }

    #[test]
    fn test_hull_collection_variant_wins() {
        let (mut scene, mapper) = setup();
        let mut tables = MappingTables::new();
        tables.insert_collection(
            MaterialVariantCollection::for_slot("Hull_Top")
                .with_variant(MaterialVariant::color("grey", Color::from_hex(0x606060)))
                .with_variant(MaterialVariant::color("white", Color::from_hex(0xEEEEEE))),
        );
        run(&mut scene, &mapper, &Configuration::new().with_hull_color(HullColor::Grey), &tables);
        assert_eq!(color_of(&scene, "Hull_Top"), Color::from_hex(0x606060));
        assert_eq!(color_of(&scene, "Hull_Bottom"), HullColor::Grey.fallback());

        run(&mut scene, &mapper, &Configuration::new(), &tables);
        assert_eq!(color_of(&scene, "Hull_Top"), Color::from_hex(0xEEEEEE));
        assert_eq!(color_of(&scene, "Hull_Bottom"), Color::from_hex(AUTHORED_HULL));
    }

    #[test]
    fn test_min_reflectivity_only_when_unset() {
        let (mut scene, mapper) = setup();
        let tables = MappingTables::new();
        run(&mut scene, &mapper, &Configuration::new(), &tables);
        for (_, material) in scene.materials() {
            match material.kind {
                MaterialKind::Standard if material.name == "Glass" => {
                    assert_eq!(material.reflectivity, Some(0.9))
                }
                MaterialKind::Standard => assert_eq!(material.reflectivity, Some(MIN_REFLECTIVITY)),
                MaterialKind::DepthMask(_) => assert_eq!(material.reflectivity, None),
            }
        }
        let again = mapper.plan(&scene, &Configuration::new(), &tables, &OptionCatalog::new());
        assert!(again.is_empty());
    }

    #[test]
    fn test_depth_masks_installed_under_prefixed_group() {
        let (scene, mapper) = setup();
        assert_eq!(mapper.depth_mask_count(), 2);
        let mask = scene.node(scene.find_first("Mask_A").unwrap()).unwrap();
        assert!(mask.depth_mask);
        assert!(!mask.cast_shadow);
        assert_eq!(mask.render_order, DEPTH_MASK_RENDER_ORDER);
        assert_eq!(mask.materials.as_slice(), &[mapper.mask_material().unwrap()]);
        let material = scene.material(mask.materials[0]).unwrap();
        let MaterialKind::DepthMask(state) = material.kind else {
            panic!("mask node kept its authored material");
        };
        assert!(!state.color_write);
        assert!(state.depth_write);

        // The hull still uses the real slot
        let hull = scene.node(scene.find_first("Hull").unwrap()).unwrap();
        assert_eq!(hull.materials[0], scene.find_material("Hull_Top").unwrap());
    }

    #[test]
    fn test_unknown_names_are_skipped() {
        let mut b = SceneTemplate::builder("bare");
        b.mesh("Something", None, &["Other"]);
        let mut scene = SceneGraph::instantiate(&b.build());
        let mapper = ConfigurationMapper::new(&mut scene, ModelDescriptor::builtin(BaseModelId::Tide));
        let config = Configuration::new().with_hull_color(HullColor::Grey);
        let plan = mapper.apply_configuration(&mut scene, &config, &MappingTables::new(), &OptionCatalog::new());
        // Only the reflectivity default lands
        assert_eq!(plan.materials.len(), 1);
        assert_eq!(color_of(&scene, "Other"), Color::WHITE);
    }
}
