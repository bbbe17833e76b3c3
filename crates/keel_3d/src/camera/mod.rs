//! Orbit camera and pointer input
//!
//! - [`OrbitController`] - Orbits a target pinned to the hull's horizontal
//!   center, clamped to a per-wave-mode [`OrbitBounds`] profile
//! - [`InputController`] - Pointer state machine that makes one button
//!   pan-only and suppresses another

mod input;
mod orbit;

pub use input::{EventResponse, InputBindings, InputController, InputMode, PointerButton, PointerEvent, PressStage};
pub use orbit::OrbitController;

use crate::model::WaveMode;
use keel_core::{Quat, Vec3};
use std::f32::consts::PI;

/// Height of the orbit target above the waterline
pub const TARGET_HEIGHT: f32 = 0.4;

/// Transform output from the camera controller
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTransform {
    /// World position
    pub position: Vec3,
    /// Rotation as quaternion
    pub rotation: Quat,
    /// Point the camera looks at
    pub target: Vec3,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            target: Vec3::ZERO,
        }
    }
}

/// Polar angle and distance limits of the orbit
///
/// Polar angles are measured from straight up: `0` looks down on the boat,
/// `PI / 2` is level with the target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitBounds {
    pub min_polar: f32,
    pub max_polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitBounds {
    /// Low, close orbit used on the water
    pub const OCEAN: OrbitBounds = OrbitBounds {
        min_polar: PI * 0.25,
        max_polar: PI * 0.47,
        min_distance: 3.0,
        max_distance: 10.0,
    };

    /// Wide orbit used in dry-dock, allows looking almost straight down
    pub const DRY_DOCK: OrbitBounds = OrbitBounds {
        min_polar: PI * 0.02,
        max_polar: PI * 0.60,
        min_distance: 2.0,
        max_distance: 16.0,
    };

    pub fn for_wave_mode(mode: WaveMode) -> Self {
        match mode {
            WaveMode::Ocean => Self::OCEAN,
            WaveMode::DryDock => Self::DRY_DOCK,
        }
    }

    pub fn clamp_polar(&self, polar: f32) -> f32 {
        polar.clamp(self.min_polar, self.max_polar)
    }

    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }
}
