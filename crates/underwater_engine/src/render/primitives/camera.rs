//! Camera view state
//!
//! The camera is owned by the caller and read-only to the pipeline. Matrices
//! arrive pre-built; the convenience constructor exists for drivers and
//! tests that do not have their own camera system.

use crate::foundation::math::{deg_to_rad, Mat4, Mat4Ext, Vec3};
use crate::render::primitives::Frustum;

/// Z-buffer convention of the camera's depth range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthConvention {
    /// Near plane at 0, far plane at 1
    Standard,
    /// Near plane at 1, far plane at 0 (better float precision far away)
    Reversed,
}

/// Per-frame camera state consumed by the mask pipeline
#[derive(Debug, Clone)]
pub struct CameraView {
    /// Camera position in world space
    pub position: Vec3,
    /// World-to-view matrix
    pub view: Mat4,
    /// View-to-clip matrix, depth range [0, 1]
    pub projection: Mat4,
    /// Distance to the near clipping plane
    pub near: f32,
    /// Distance to the far clipping plane
    pub far: f32,
    /// Depth-buffer convention the projection was built for
    pub depth_convention: DepthConvention,
    /// Viewport dimensions in pixels (width, height)
    pub viewport: (u32, u32),
}

impl CameraView {
    /// Create a perspective camera looking from `position` toward `target`
    pub fn perspective(
        position: Vec3,
        target: Vec3,
        fov_degrees: f32,
        viewport: (u32, u32),
        near: f32,
        far: f32,
    ) -> Self {
        let aspect = viewport.0 as f32 / viewport.1 as f32;
        let view = Mat4::look_at(position, target, Vec3::new(0.0, 1.0, 0.0));
        let projection = Mat4::perspective(deg_to_rad(fov_degrees), aspect, near, far)
            * Mat4::clip_coordinate_transform();

        Self {
            position,
            view,
            projection,
            near,
            far,
            depth_convention: DepthConvention::Standard,
            viewport,
        }
    }

    /// Combined world-to-clip matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Inverse of the combined matrix, if it exists
    ///
    /// The horizon shader uses this to reconstruct world positions from
    /// screen coordinates.
    pub fn inverse_view_projection(&self) -> Option<Mat4> {
        self.view_projection().try_inverse()
    }

    /// Recompute the six frustum planes for this frame's matrices
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    fn test_camera() -> CameraView {
        CameraView::perspective(
            Vec3::new(0.0, 5.0, 10.0),
            Vec3::new(0.0, 0.0, 0.0),
            60.0,
            (1920, 1080),
            0.1,
            1000.0,
        )
    }

    #[test]
    fn inverse_round_trips_a_clip_point() {
        let camera = test_camera();
        let vp = camera.view_projection();
        let inv = camera.inverse_view_projection().unwrap();

        let world = Vec4::new(3.0, 1.0, -2.0, 1.0);
        let clip = vp * world;
        let back = inv * clip;

        assert_relative_eq!(back.x / back.w, world.x, epsilon = 1e-3);
        assert_relative_eq!(back.y / back.w, world.y, epsilon = 1e-3);
        assert_relative_eq!(back.z / back.w, world.z, epsilon = 1e-3);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = test_camera();
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);

        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
        assert!(clip.w > 0.0, "point in front of the camera must have w > 0");
    }
}
