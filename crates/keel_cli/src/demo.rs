//! Built-in stand-in hulls
//!
//! Used when a hull asset is missing so the engine can still be driven end
//! to end. Node and material names follow the built-in descriptors.

use keel_3d::descriptor::ModelDescriptor;
use keel_3d::model::BaseModelId;
use keel_3d::scene::SceneTemplate;
use keel_core::{BoundingBox, Color, Vec3};

pub fn hull(base: BaseModelId) -> SceneTemplate {
    let descriptor = ModelDescriptor::builtin(base);
    let length = match base {
        BaseModelId::Lagoon => 5.2,
        BaseModelId::Tide => 6.4,
    };

    let mut b = SceneTemplate::builder(format!("{base} (demo)"));
    let boat = b.group("Boat", None);

    let shell = b.mesh("Hull", Some(boat), &["Hull_Top", "Hull_Bottom"]);
    b.bounds(
        shell,
        BoundingBox::new(Vec3::new(-1.1, -0.4, -length / 2.0), Vec3::new(1.1, 0.9, length / 2.0)),
    );
    b.material_color("Hull_Top", Color::WHITE);
    b.material_color("Hull_Bottom", Color::from_hex(0xF4F4F2));

    for name in &descriptor.material_meshes {
        let material = format!("{name}_Paint");
        b.mesh(name, Some(boat), &[material.as_str()]);
    }
    for name in descriptor.deck_meshes.iter().chain(&descriptor.strip_meshes) {
        // Deck pads may already exist as finish meshes
        if descriptor.is_material_mesh(name) {
            continue;
        }
        let material = format!("{name}_Foam");
        b.mesh(name, Some(boat), &[material.as_str()]);
    }

    let power = b.group("Power", Some(boat));
    b.mesh("Motor", Some(power), &["Motor_Cowl"]);
    b.mesh("Battery", Some(power), &["Battery_Case"]);

    let bimini = b.group("Bimini", Some(boat));
    b.mesh("Bimini_Frame", Some(bimini), &["Metal"]);
    b.mesh("Bimini_Canvas", Some(bimini), &["Canvas"]);

    let mask = b.mesh("DepthMask_Interior", Some(boat), &["Hull_Top"]);
    b.depth_mask(mask);
    b.build()
}
