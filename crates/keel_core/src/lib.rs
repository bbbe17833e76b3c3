//! Keel Core
//!
//! Plain value types shared by the Keel configurator crates:
//!
//! - **Vectors**: [`Vec2`] and [`Vec3`] with the handful of operations the
//!   engine needs
//! - **Color**: linear RGBA [`Color`] with `#RRGGBB` parsing
//! - **Rotation**: [`Quat`] for camera and boat orientation
//! - **Bounds**: axis-aligned [`BoundingBox`]
//!
//! Nothing in this crate performs I/O.

pub mod bounds;
pub mod color;
pub mod quat;
pub mod vec;

pub use bounds::BoundingBox;
pub use color::{Color, ParseColorError};
pub use quat::Quat;
pub use vec::{Vec2, Vec3};
