//! Material slots and render state

use keel_core::Color;

/// Reflectivity given to every standard material that has none authored
pub const MIN_REFLECTIVITY: f32 = 0.5;

/// Render order of depth-mask helpers; lower draws first
pub const DEPTH_MASK_RENDER_ORDER: i32 = 1;

/// Render order of the animated water disk
pub const WATER_RENDER_ORDER: i32 = 2;

/// Which side of faces to render
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    /// Render front faces only
    #[default]
    Front,
    /// Render back faces only
    Back,
    /// Render both sides
    Double,
}

impl Side {
    /// Face to cull for this side setting
    pub fn cull_mode(self) -> Option<wgpu::Face> {
        match self {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        }
    }
}

/// Texture reference carried by a material
#[derive(Clone, Debug, PartialEq)]
pub struct TextureRef {
    /// Source URI or path as authored in the asset
    pub source: String,
}

/// Shading model of a material slot
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialKind {
    /// Metallic-roughness PBR material
    Standard,
    /// Depth-only occluder used to clip the water surface
    DepthMask(DepthMaskState),
}

/// A named material binding shared by any number of meshes
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
    /// `None` until authored or filled in by the apply pass
    pub reflectivity: Option<f32>,
    pub side: Side,
    pub map: Option<TextureRef>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: MaterialKind::Standard,
            color: Color::WHITE,
            metalness: 0.0,
            roughness: 0.5,
            opacity: 1.0,
            transparent: false,
            reflectivity: None,
            side: Side::Front,
            map: None,
        }
    }
}

impl Material {
    pub fn standard(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            ..Default::default()
        }
    }

    /// Replacement material installed on depth-mask nodes
    pub fn depth_mask(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::DepthMask(DepthMaskState::default()),
            side: Side::Double,
            ..Default::default()
        }
    }

    /// Whether the color/finish rules may touch this material
    pub fn is_standard(&self) -> bool {
        matches!(self.kind, MaterialKind::Standard)
    }

    pub fn is_depth_mask(&self) -> bool {
        matches!(self.kind, MaterialKind::DepthMask(_))
    }

    /// Apply a patch, returning whether anything changed
    pub fn apply(&mut self, patch: &MaterialPatch) -> bool {
        let before = self.clone();
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(metalness) = patch.metalness {
            self.metalness = metalness.clamp(0.0, 1.0);
        }
        if let Some(roughness) = patch.roughness {
            self.roughness = roughness.clamp(0.0, 1.0);
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity;
            self.transparent = opacity < 1.0;
        }
        if let Some(reflectivity) = patch.reflectivity {
            self.reflectivity = Some(reflectivity);
        }
        *self != before
    }

    /// Whether applying `patch` would change this material
    pub fn differs_from(&self, patch: &MaterialPatch) -> bool {
        patch.color.is_some_and(|c| c != self.color)
            || patch.metalness.is_some_and(|m| m != self.metalness)
            || patch.roughness.is_some_and(|r| r != self.roughness)
            || patch.opacity.is_some_and(|o| o != self.opacity)
            || patch.reflectivity.is_some_and(|r| Some(r) != self.reflectivity)
    }
}

/// Partial update of a material's color parameters
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MaterialPatch {
    pub color: Option<Color>,
    pub metalness: Option<f32>,
    pub roughness: Option<f32>,
    pub opacity: Option<f32>,
    pub reflectivity: Option<f32>,
}

impl MaterialPatch {
    pub fn color(color: Color) -> Self {
        Self {
            color: Some(color),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combine two patches, fields of `later` win
    pub fn merged(self, later: MaterialPatch) -> Self {
        Self {
            color: later.color.or(self.color),
            metalness: later.metalness.or(self.metalness),
            roughness: later.roughness.or(self.roughness),
            opacity: later.opacity.or(self.opacity),
            reflectivity: later.reflectivity.or(self.reflectivity),
        }
    }
}

/// Polygon offset used to keep masks from z-fighting the hull
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolygonOffset {
    pub factor: f32,
    pub units: i32,
}

/// Fixed-function state of a depth-mask material
///
/// Writes depth only, so the water drawn afterwards is clipped where the
/// hull sits without the mask itself showing up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthMaskState {
    pub color_write: bool,
    pub depth_write: bool,
    pub depth_test: bool,
    pub polygon_offset: PolygonOffset,
}

impl Default for DepthMaskState {
    fn default() -> Self {
        Self {
            color_write: false,
            depth_write: true,
            depth_test: true,
            polygon_offset: PolygonOffset {
                factor: 1.0,
                units: 1,
            },
        }
    }
}

impl DepthMaskState {
    /// Depth-stencil state for the mask pipeline
    pub fn depth_stencil(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.depth_write,
            depth_compare: if self.depth_test {
                wgpu::CompareFunction::LessEqual
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: self.polygon_offset.units,
                slope_scale: self.polygon_offset.factor,
                clamp: 0.0,
            },
        }
    }

    /// Color target for the mask pipeline
    pub fn color_target(&self, format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format,
            blend: None,
            write_mask: if self.color_write {
                wgpu::ColorWrites::ALL
            } else {
                wgpu::ColorWrites::empty()
            },
        }
    }

    /// Primitive state; masks are double-sided
    pub fn primitive(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Side::Double.cull_mode(),
            ..Default::default()
        }
    }
}
