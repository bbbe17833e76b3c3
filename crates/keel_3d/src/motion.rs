//! Idle boat motion

use crate::model::WaveMode;
use keel_core::{Quat, Vec3};
use std::f32::consts::TAU;

/// Pitch amplitude on the water (radians, about X)
pub const OCEAN_PITCH_AMPLITUDE: f32 = 0.025;
/// Pitch frequency (Hz)
pub const OCEAN_PITCH_FREQUENCY: f32 = 0.35;
/// Roll amplitude on the water (radians, about Z)
pub const OCEAN_ROLL_AMPLITUDE: f32 = 0.012;
/// Roll frequency (Hz)
pub const OCEAN_ROLL_FREQUENCY: f32 = 0.22;
/// Hull sits slightly in the water
pub const OCEAN_Y_OFFSET: f32 = -0.08;
/// Hull raised onto stands
pub const DRY_DOCK_Y_OFFSET: f32 = 0.35;

/// Pose applied to the boat root
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoatPose {
    /// Rotation about X (radians)
    pub pitch: f32,
    /// Rotation about Z (radians)
    pub roll: f32,
    pub y_offset: f32,
}

impl BoatPose {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(self.pitch, 0.0, self.roll)
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(0.0, self.y_offset, 0.0)
    }
}

/// Pose for a wave mode at `elapsed` seconds of wall-clock time
pub fn boat_pose(mode: WaveMode, elapsed: f32) -> BoatPose {
    match mode {
        WaveMode::Ocean => BoatPose {
            pitch: OCEAN_PITCH_AMPLITUDE * (elapsed * OCEAN_PITCH_FREQUENCY * TAU).sin(),
            roll: OCEAN_ROLL_AMPLITUDE * (elapsed * OCEAN_ROLL_FREQUENCY * TAU).sin(),
            y_offset: OCEAN_Y_OFFSET,
        },
        WaveMode::DryDock => BoatPose {
            pitch: 0.0,
            roll: 0.0,
            y_offset: DRY_DOCK_Y_OFFSET,
        },
    }
}

/// Wall-clock driven animator
#[derive(Clone, Debug, Default)]
pub struct MotionAnimator {
    elapsed: f32,
}

impl MotionAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn pose(&self, mode: WaveMode) -> BoatPose {
        boat_pose(mode, self.elapsed)
    }
}
