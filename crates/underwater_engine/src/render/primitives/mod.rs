//! Core rendering primitives

pub mod camera;
pub mod frustum;

pub use camera::{CameraView, DepthConvention};
pub use frustum::{Aabb, Frustum, Plane};
