//! Frame summaries printed by `keel render`

use keel_3d::configurator::RenderFrame;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DrawSummary {
    pub name: String,
    pub render_order: i32,
    pub cast_shadow: bool,
    pub depth_mask: bool,
    /// Hex colors of the resolved materials
    pub colors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub frame: usize,
    pub loading: bool,
    pub camera_position: [f32; 3],
    pub camera_target: [f32; 3],
    pub pitch: f32,
    pub roll: f32,
    pub y_offset: f32,
    pub water: bool,
    pub draws: Vec<DrawSummary>,
}

impl FrameReport {
    pub fn new(index: usize, frame: &RenderFrame, with_draws: bool) -> Self {
        let p = frame.camera.position;
        let t = frame.camera.target;
        let draws = if with_draws {
            frame
                .draws
                .iter()
                .map(|d| DrawSummary {
                    name: d.name.clone(),
                    render_order: d.render_order,
                    cast_shadow: d.cast_shadow,
                    depth_mask: d.depth_mask,
                    colors: d.materials.iter().map(|m| format!("#{:06X}", m.color.to_hex())).collect(),
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            frame: index,
            loading: frame.loading,
            camera_position: [p.x, p.y, p.z],
            camera_target: [t.x, t.y, t.z],
            pitch: frame.pose.pitch,
            roll: frame.pose.roll,
            y_offset: frame.pose.y_offset,
            water: frame.water.is_some(),
            draws,
        }
    }
}
