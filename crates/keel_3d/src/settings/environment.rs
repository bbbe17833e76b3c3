//! Lighting, fog and water parameters

use indexmap::IndexMap;
use keel_core::{Color, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat parameter bag for lighting, fog and water
///
/// Fetched from the settings store and merged key by key over the built-in
/// defaults. A key whose value has the wrong shape keeps its default; keys
/// the engine does not know are carried along in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentSettings {
    pub ambient_intensity: f32,
    pub sun_intensity: f32,
    /// Direction towards the sun, `[x, y, z]`
    pub sun_direction: [f32; 3],
    pub sun_color: Color,
    pub fog_color: Color,
    pub fog_near: f32,
    pub fog_far: f32,
    /// Base tint of the water surface
    pub water_color: Color,
    /// Radius of the water disk in world units
    pub water_radius: f32,
    pub water_segments: u32,
    pub distortion_scale: f32,
    /// Water alpha (1.0 = opaque)
    pub water_alpha: f32,
    pub wave_size: f32,
    /// Multiplier applied to frame time when advancing the water clock
    pub wave_speed: f32,
    /// Keys without a dedicated field, in payload order
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.6,
            sun_intensity: 1.2,
            sun_direction: [0.70707, 0.70707, 0.0],
            sun_color: Color::WHITE,
            fog_color: Color::from_hex(0xDDE6EE),
            fog_near: 30.0,
            fog_far: 120.0,
            water_color: Color::from_hex(0x001E0F),
            water_radius: 40.0,
            water_segments: 64,
            distortion_scale: 3.7,
            water_alpha: 0.9,
            wave_size: 1.0,
            wave_speed: 0.6,
            extra: IndexMap::new(),
        }
    }
}

impl EnvironmentSettings {
    /// Merge a payload object over the defaults
    pub fn merged(payload: &Map<String, Value>) -> Self {
        let Ok(Value::Object(mut merged)) = serde_json::to_value(Self::default()) else {
            return Self::default();
        };

        for (key, value) in payload {
            if !merged.contains_key(key) {
                merged.insert(key.clone(), value.clone());
                continue;
            }
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value.clone());
            match serde_json::from_value::<Self>(Value::Object(candidate)) {
                Ok(_) => {
                    merged.insert(key.clone(), value.clone());
                }
                Err(err) => {
                    tracing::warn!(key = %key, %err, "ignoring malformed environment value");
                }
            }
        }

        serde_json::from_value(Value::Object(merged)).unwrap_or_else(|err| {
            tracing::warn!(%err, "environment merge failed, using defaults");
            Self::default()
        })
    }

    /// Normalized sun direction
    pub fn sun_dir(&self) -> Vec3 {
        Vec3::from(self.sun_direction).normalize()
    }
}
