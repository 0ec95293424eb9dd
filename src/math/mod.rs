//! Math types used by the render backend, mostly re-exported from `cgmath`.

pub mod aabb;
pub mod color;

pub mod prelude {
    pub use cgmath::prelude::*;
    pub use cgmath::{Matrix4, Point3, Vector3, Vector4};

    pub use super::aabb::Aabb3;
    pub use super::color::Color;
}
