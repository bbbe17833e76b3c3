//! Animated water surface
//!
//! A translucent disk around the boat, shaded by a reflective water shader.
//! Only exists in ocean mode. The wave clock advances by frame time scaled
//! by `wave_speed` and never wraps.

use crate::error::LoadError;
use crate::loader::TextureData;
use crate::settings::EnvironmentSettings;
use keel_core::Color;
use std::f32::consts::TAU;
use std::sync::Arc;

/// GPU uniform data for the water shader
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterUniform {
    /// Normalized direction towards the sun, w unused
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    pub water_color: [f32; 4],
    pub distortion_scale: f32,
    pub alpha: f32,
    pub size: f32,
    pub time: f32,
}

/// Water mesh vertex
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Water surface state
#[derive(Clone, Debug)]
pub struct WaterSurface {
    sun_direction: [f32; 3],
    sun_color: Color,
    water_color: Color,
    distortion_scale: f32,
    alpha: f32,
    size: f32,
    speed: f32,
    radius: f32,
    segments: u32,
    time: f32,
    normals: Option<Arc<TextureData>>,
    disabled: bool,
}

impl WaterSurface {
    pub fn from_environment(env: &EnvironmentSettings) -> Self {
        Self {
            sun_direction: env.sun_dir().to_array(),
            sun_color: env.sun_color,
            water_color: env.water_color,
            distortion_scale: env.distortion_scale,
            alpha: env.water_alpha.clamp(0.0, 1.0),
            size: env.wave_size,
            speed: env.wave_speed,
            radius: env.water_radius.max(0.0),
            segments: env.water_segments,
            time: 0.0,
            normals: None,
            disabled: false,
        }
    }

    /// Take new shading and disk parameters, keeping the wave clock and normals
    pub fn set_environment(&mut self, env: &EnvironmentSettings) {
        let rebuilt = Self::from_environment(env);
        *self = Self {
            time: self.time,
            normals: self.normals.take(),
            disabled: self.disabled,
            ..rebuilt
        };
    }

    /// Advance the wave clock
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.time += dt * self.speed;
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Install the normal map, or disable the water if it failed to load
    pub fn set_normals(&mut self, normals: Result<Arc<TextureData>, LoadError>) {
        match normals {
            Ok(texture) => {
                self.normals = Some(texture);
                self.disabled = false;
            }
            Err(err) => {
                tracing::warn!(%err, "water normals unavailable, disabling water");
                self.normals = None;
                self.disabled = true;
            }
        }
    }

    pub fn normals(&self) -> Option<&Arc<TextureData>> {
        self.normals.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    pub fn uniform(&self) -> WaterUniform {
        let [x, y, z] = self.sun_direction;
        WaterUniform {
            sun_direction: [x, y, z, 0.0],
            sun_color: self.sun_color.to_array(),
            water_color: self.water_color.to_array(),
            distortion_scale: self.distortion_scale,
            alpha: self.alpha,
            size: self.size,
            time: self.time,
        }
    }

    pub fn mesh(&self) -> (Vec<WaterVertex>, Vec<u32>) {
        generate_disk(self.radius, self.segments)
    }
}

/// Flat disk in the XZ plane: a center vertex plus a ring
pub fn generate_disk(radius: f32, segments: u32) -> (Vec<WaterVertex>, Vec<u32>) {
    let segments = segments.clamp(8, 1024);
    let mut vertices = Vec::with_capacity(segments as usize + 1);
    let mut indices = Vec::with_capacity(segments as usize * 3);

    vertices.push(WaterVertex {
        position: [0.0, 0.0, 0.0],
        uv: [0.5, 0.5],
    });
    for i in 0..segments {
        let (sin, cos) = (i as f32 / segments as f32 * TAU).sin_cos();
        vertices.push(WaterVertex {
            position: [cos * radius, 0.0, sin * radius],
            uv: [cos * 0.5 + 0.5, sin * 0.5 + 0.5],
        });
    }

    for i in 0..segments {
        let current = i + 1;
        let next = (i + 1) % segments + 1;
        // Counter-clockwise seen from above
        indices.extend_from_slice(&[0, next, current]);
    }

    (vertices, indices)
}
