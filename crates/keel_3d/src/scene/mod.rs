//! Scene graph
//!
//! A [`SceneGraph`] is the private, mutable copy of a [`SceneTemplate`]
//! owned by one configuration session. Nodes and materials live in slotmap
//! arenas; names are indexed once at instantiation so rule passes never walk
//! the tree looking for a name.

mod material;
mod template;

pub use material::{
    DepthMaskState, Material, MaterialKind, MaterialPatch, PolygonOffset, Side, TextureRef,
    DEPTH_MASK_RENDER_ORDER, MIN_REFLECTIVITY, WATER_RENDER_ORDER,
};
pub use template::{NodeTransform, SceneTemplate, SceneTemplateBuilder, TemplateMesh, TemplateNode};

use keel_core::{BoundingBox, Vec2};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

slotmap::new_key_type! {
    /// Handle to a node in a [`SceneGraph`]
    pub struct NodeId;
    /// Handle to a material slot in a [`SceneGraph`]
    pub struct MaterialId;
}

/// Node kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Mesh,
}

/// A node of the instantiated scene
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
    /// Material slots bound to this mesh (empty for groups)
    pub materials: SmallVec<[MaterialId; 2]>,
    pub transform: NodeTransform,
    /// Geometry bounds in node space
    pub bounds: BoundingBox,
    /// Resolved visibility (already includes ancestors)
    pub visible: bool,
    pub cast_shadow: bool,
    /// Shadow flag as authored, restored when the node becomes visible
    pub authored_cast_shadow: bool,
    pub depth_mask: bool,
    /// Higher draws later
    pub render_order: i32,
}

impl SceneNode {
    pub fn is_mesh(&self) -> bool {
        self.kind == NodeKind::Mesh
    }
}

/// Mutable scene instance with name indexes
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    name: String,
    nodes: SlotMap<NodeId, SceneNode>,
    materials: SlotMap<MaterialId, Material>,
    roots: Vec<NodeId>,
    /// Parents before children
    preorder: Vec<NodeId>,
    nodes_by_name: FxHashMap<String, SmallVec<[NodeId; 1]>>,
    materials_by_name: FxHashMap<String, SmallVec<[MaterialId; 1]>>,
    bounds: BoundingBox,
}

impl SceneGraph {
    /// Deep-copy a template into a fresh scene
    pub fn instantiate(template: &SceneTemplate) -> Self {
        let mut scene = SceneGraph {
            name: template.name.clone(),
            ..Default::default()
        };

        let material_ids: Vec<MaterialId> = template
            .materials
            .iter()
            .map(|m| {
                let id = scene.materials.insert(m.clone());
                scene.materials_by_name.entry(m.name.clone()).or_default().push(id);
                id
            })
            .collect();

        let mut node_ids: Vec<Option<NodeId>> = vec![None; template.nodes.len()];
        let mut stack: Vec<(usize, Option<NodeId>)> =
            template.root_nodes.iter().rev().map(|&i| (i, None)).collect();

        while let Some((index, parent)) = stack.pop() {
            let Some(source) = template.nodes.get(index) else {
                tracing::warn!(index, "template references missing node");
                continue;
            };
            if node_ids[index].is_some() {
                tracing::warn!(node = %source.name, "node reachable twice, keeping first");
                continue;
            }

            let (kind, materials, bounds) = match &source.mesh {
                Some(mesh) => (
                    NodeKind::Mesh,
                    mesh.materials
                        .iter()
                        .filter_map(|&m| material_ids.get(m).copied())
                        .collect(),
                    mesh.bounds,
                ),
                None => (NodeKind::Group, SmallVec::new(), BoundingBox::empty()),
            };

            let id = scene.nodes.insert(SceneNode {
                name: source.name.clone(),
                kind,
                parent,
                children: SmallVec::new(),
                materials,
                transform: source.transform,
                bounds,
                visible: true,
                cast_shadow: source.cast_shadow,
                authored_cast_shadow: source.cast_shadow,
                depth_mask: source.depth_mask,
                render_order: 0,
            });
            node_ids[index] = Some(id);
            scene.preorder.push(id);
            scene.nodes_by_name.entry(source.name.clone()).or_default().push(id);

            match parent {
                Some(p) => scene.nodes[p].children.push(id),
                None => scene.roots.push(id),
            }

            for &child in source.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        scene.bounds = scene.compute_bounds();
        tracing::debug!(
            scene = %scene.name,
            nodes = scene.nodes.len(),
            materials = scene.materials.len(),
            "scene instantiated"
        );
        scene
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// All nodes carrying `name` (usually one)
    pub fn find(&self, name: &str) -> &[NodeId] {
        self.nodes_by_name.get(name).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    /// First node carrying `name`
    pub fn find_first(&self, name: &str) -> Option<NodeId> {
        self.find(name).first().copied()
    }

    /// All material slots carrying `name`
    ///
    /// Exporters may emit several materials under one name, e.g. when a
    /// mesh is split into primitives.
    pub fn find_materials(&self, name: &str) -> &[MaterialId] {
        self.materials_by_name.get(name).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    /// First material slot carrying `name`
    pub fn find_material(&self, name: &str) -> Option<MaterialId> {
        self.find_materials(name).first().copied()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Node ids in depth-first order, parents before children
    pub fn preorder(&self) -> &[NodeId] {
        &self.preorder
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.preorder.iter().map(move |&id| (id, &self.nodes[id]))
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter()
    }

    /// Add a material slot that is not part of the template
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let name = material.name.clone();
        let id = self.materials.insert(material);
        self.materials_by_name.entry(name).or_default().push(id);
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// World-space bounds of all mesh geometry, computed at instantiation
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Horizontal (x, z) center of [`bounds`](Self::bounds)
    pub fn horizontal_center(&self) -> Option<Vec2> {
        self.bounds.horizontal_center()
    }

    /// Iterate `id` and all of its descendants
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                out.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn compute_bounds(&self) -> BoundingBox {
        let mut total = BoundingBox::empty();
        for (id, node) in self.nodes.iter() {
            if !node.is_mesh() || node.bounds.is_empty() {
                continue;
            }
            for corner in corners(&node.bounds) {
                let mut point = corner;
                let mut current = Some(id);
                while let Some(c) = current {
                    let n = &self.nodes[c];
                    point = n.transform.transform_point(point);
                    current = n.parent;
                }
                total.expand_to_include(point);
            }
        }
        total
    }
}

fn corners(b: &BoundingBox) -> [keel_core::Vec3; 8] {
    use keel_core::Vec3;
    [
        Vec3::new(b.min.x, b.min.y, b.min.z),
        Vec3::new(b.max.x, b.min.y, b.min.z),
        Vec3::new(b.min.x, b.max.y, b.min.z),
        Vec3::new(b.max.x, b.max.y, b.min.z),
        Vec3::new(b.min.x, b.min.y, b.max.z),
        Vec3::new(b.max.x, b.min.y, b.max.z),
        Vec3::new(b.min.x, b.max.y, b.max.z),
        Vec3::new(b.max.x, b.max.y, b.max.z),
    ]
}
