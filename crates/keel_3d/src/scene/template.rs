//! Immutable scene templates
//!
//! A template is what a [`SceneSource`](crate::loader::SceneSource) produces
//! from an asset file. Templates are cached and shared behind `Arc`; they are
//! never mutated. Every session instantiates its own
//! [`SceneGraph`](super::SceneGraph) from one.

use super::material::{Material, TextureRef};
use keel_core::{BoundingBox, Color, Quat, Vec3};
use std::path::PathBuf;

/// Local transform of a node
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl NodeTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Map a point from node space into parent space
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let scaled = Vec3::new(p.x * self.scale.x, p.y * self.scale.y, p.z * self.scale.z);
        self.rotation.rotate_vec3(scaled) + self.translation
    }
}

/// Mesh payload of a template node
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateMesh {
    /// Indices into [`SceneTemplate::materials`], one per primitive
    pub materials: Vec<usize>,
    /// Geometry bounds in node space
    pub bounds: BoundingBox,
}

/// A scene hierarchy node
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateNode {
    pub name: String,
    pub transform: NodeTransform,
    /// Present for mesh nodes
    pub mesh: Option<TemplateMesh>,
    pub children: Vec<usize>,
    /// Authored shadow-casting flag
    pub cast_shadow: bool,
    /// Explicit depth-mask marker from the asset
    pub depth_mask: bool,
}

/// A loaded, immutable scene asset
#[derive(Clone, Debug, Default)]
pub struct SceneTemplate {
    /// Scene name (usually the file stem)
    pub name: String,
    /// Source file path
    pub source_path: PathBuf,
    pub nodes: Vec<TemplateNode>,
    pub materials: Vec<Material>,
    pub root_nodes: Vec<usize>,
}

impl SceneTemplate {
    /// Create an empty template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Start building a template by hand
    pub fn builder(name: impl Into<String>) -> SceneTemplateBuilder {
        SceneTemplateBuilder {
            template: Self::new(name),
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.mesh.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Programmatic template construction
///
/// Used by tests, benchmarks and the CLI's demo hull. Materials are
/// created on first mention by name.
///
/// ```ignore
/// let mut b = SceneTemplate::builder("lagoon");
/// let boat = b.group("Boat", None);
/// b.mesh("Hull", Some(boat), &["Hull_Top", "Hull_Bottom"]);
/// let template = b.build();
/// ```
pub struct SceneTemplateBuilder {
    template: SceneTemplate,
}

impl SceneTemplateBuilder {
    fn push(&mut self, node: TemplateNode, parent: Option<usize>) -> usize {
        let index = self.template.nodes.len();
        self.template.nodes.push(node);
        match parent {
            Some(p) => self.template.nodes[p].children.push(index),
            None => self.template.root_nodes.push(index),
        }
        index
    }

    /// Add a group node
    pub fn group(&mut self, name: &str, parent: Option<usize>) -> usize {
        self.push(
            TemplateNode {
                name: name.to_string(),
                transform: NodeTransform::default(),
                mesh: None,
                children: Vec::new(),
                cast_shadow: false,
                depth_mask: false,
            },
            parent,
        )
    }

    /// Add a shadow-casting mesh node bound to the named materials
    pub fn mesh(&mut self, name: &str, parent: Option<usize>, materials: &[&str]) -> usize {
        let materials = materials.iter().map(|m| self.material_index(m)).collect();
        self.push(
            TemplateNode {
                name: name.to_string(),
                transform: NodeTransform::default(),
                mesh: Some(TemplateMesh {
                    materials,
                    bounds: BoundingBox::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5)),
                }),
                children: Vec::new(),
                cast_shadow: true,
                depth_mask: false,
            },
            parent,
        )
    }

    fn material_index(&mut self, name: &str) -> usize {
        if let Some(i) = self.template.materials.iter().position(|m| m.name == name) {
            return i;
        }
        self.template.materials.push(Material::standard(name, Color::WHITE));
        self.template.materials.len() - 1
    }

    /// Set the authored color of a material, creating it if needed
    pub fn material_color(&mut self, name: &str, color: Color) -> &mut Self {
        let i = self.material_index(name);
        self.template.materials[i].color = color;
        self
    }

    /// Give a material an authored reflectivity
    pub fn material_reflectivity(&mut self, name: &str, reflectivity: f32) -> &mut Self {
        let i = self.material_index(name);
        self.template.materials[i].reflectivity = Some(reflectivity);
        self
    }

    /// Give a material a texture map
    pub fn material_map(&mut self, name: &str, source: &str) -> &mut Self {
        let i = self.material_index(name);
        self.template.materials[i].map = Some(TextureRef {
            source: source.to_string(),
        });
        self
    }

    pub fn translate(&mut self, node: usize, translation: Vec3) -> &mut Self {
        self.template.nodes[node].transform.translation = translation;
        self
    }

    /// Replace a mesh node's geometry bounds
    pub fn bounds(&mut self, node: usize, bounds: BoundingBox) -> &mut Self {
        if let Some(mesh) = self.template.nodes[node].mesh.as_mut() {
            mesh.bounds = bounds;
        }
        self
    }

    /// Flag a node as a depth-mask helper
    pub fn depth_mask(&mut self, node: usize) -> &mut Self {
        self.template.nodes[node].depth_mask = true;
        self
    }

    pub fn cast_shadow(&mut self, node: usize, cast: bool) -> &mut Self {
        self.template.nodes[node].cast_shadow = cast;
        self
    }

    pub fn build(self) -> SceneTemplate {
        self.template
    }
}
