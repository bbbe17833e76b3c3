//! glTF 2.0 scene source
//!
//! Reads the node hierarchy, material parameters and per-primitive bounds
//! of `.gltf` / `.glb` files. Vertex data is not needed for configuration,
//! so buffers are never decoded: bounds come from the accessor min/max the
//! format requires on positions.

use super::SceneSource;
use crate::error::LoadError;
use crate::scene::{
    Material, NodeTransform, SceneTemplate, Side, TemplateMesh, TemplateNode, TextureRef,
};
use gltf::Gltf;
use keel_core::{BoundingBox, Color, Quat, Vec3};
use serde::Deserialize;
use std::path::Path;

/// glTF 2.0 scene source
#[derive(Clone, Debug, Default)]
pub struct GltfSource;

impl GltfSource {
    pub fn new() -> Self {
        Self
    }
}

/// Per-node extras understood by the engine
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NodeExtras {
    depth_mask: bool,
    cast_shadow: Option<bool>,
}

impl SceneSource for GltfSource {
    fn load(&self, path: &Path) -> Result<SceneTemplate, LoadError> {
        let bytes = std::fs::read(path).map_err(|e| LoadError::io(path, e))?;
        let gltf = Gltf::from_slice(&bytes).map_err(|e| LoadError::Parse(e.to_string()))?;

        let scene_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("scene")
            .to_string();

        let mut template = SceneTemplate::new(scene_name);
        template.source_path = path.to_path_buf();
        template.materials = gltf.materials().map(|m| load_material(&m)).collect();

        let Some(scene) = gltf.default_scene().or_else(|| gltf.scenes().next()) else {
            return Err(LoadError::Parse("file contains no scene".into()));
        };

        for node in scene.nodes() {
            let index = load_node_hierarchy(&node, &mut template);
            template.root_nodes.push(index);
        }

        tracing::debug!(
            path = %path.display(),
            nodes = template.nodes.len(),
            materials = template.materials.len(),
            "glTF parsed"
        );
        Ok(template)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["gltf", "glb"]
    }

    fn name(&self) -> &'static str {
        "glTF 2.0"
    }
}

fn load_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    let name = match (material.name(), material.index()) {
        (Some(name), _) => name.to_string(),
        (None, Some(index)) => format!("material_{index}"),
        (None, None) => "default".to_string(),
    };

    let map = pbr.base_color_texture().and_then(|info| match info.texture().source().source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => Some(TextureRef {
            source: uri.to_string(),
        }),
        _ => None,
    });

    Material {
        name,
        color: Color::rgb(r, g, b),
        metalness: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        opacity: a,
        transparent: matches!(material.alpha_mode(), gltf::material::AlphaMode::Blend),
        side: if material.double_sided() { Side::Double } else { Side::Front },
        map,
        ..Default::default()
    }
}

/// Index of the material for primitives that do not name one
fn default_material(template: &mut SceneTemplate) -> usize {
    if let Some(i) = template.materials.iter().position(|m| m.name == "default") {
        return i;
    }
    template.materials.push(Material::standard("default", Color::WHITE));
    template.materials.len() - 1
}

fn load_mesh(mesh: &gltf::Mesh, template: &mut SceneTemplate) -> TemplateMesh {
    let mut bounds = BoundingBox::empty();
    let mut materials = Vec::new();
    for primitive in mesh.primitives() {
        let bb = primitive.bounding_box();
        bounds.expand_to_include(Vec3::from(bb.min));
        bounds.expand_to_include(Vec3::from(bb.max));
        let material = match primitive.material().index() {
            Some(index) => index,
            None => default_material(template),
        };
        materials.push(material);
    }
    TemplateMesh { materials, bounds }
}

fn node_extras(node: &gltf::Node) -> NodeExtras {
    let Some(raw) = node.extras() else {
        return NodeExtras::default();
    };
    serde_json::from_str(raw.get()).unwrap_or_else(|err| {
        tracing::debug!(node = node.name().unwrap_or(""), %err, "ignoring node extras");
        NodeExtras::default()
    })
}

/// Load node hierarchy recursively
fn load_node_hierarchy(node: &gltf::Node, template: &mut SceneTemplate) -> usize {
    let (translation, rotation, scale) = node.transform().decomposed();
    let extras = node_extras(node);
    let mesh = node.mesh().map(|m| load_mesh(&m, template));

    let name = node
        .name()
        .or_else(|| node.mesh().and_then(|m| m.name()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let loaded = TemplateNode {
        name,
        transform: NodeTransform {
            translation: Vec3::from(translation),
            rotation: Quat::new(rotation[0], rotation[1], rotation[2], rotation[3]),
            scale: Vec3::from(scale),
        },
        cast_shadow: extras.cast_shadow.unwrap_or(mesh.is_some()),
        mesh,
        children: Vec::new(),
        depth_mask: extras.depth_mask,
    };

    let index = template.nodes.len();
    template.nodes.push(loaded);

    let children: Vec<usize> = node
        .children()
        .map(|child| load_node_hierarchy(&child, template))
        .collect();
    template.nodes[index].children = children;

    index
}
