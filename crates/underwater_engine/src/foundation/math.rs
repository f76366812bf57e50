//! Math utilities and types
//!
//! Provides fundamental math types for the rendering pipeline. All matrices
//! produced here target a depth range of [0, 1] in clip space.

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Convert degrees to radians
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * (std::f32::consts::PI / 180.0)
}

/// Extension trait for Mat4 with projection and view helpers
pub trait Mat4Ext {
    /// Create a perspective projection matrix mapping depth to [0, 1]
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a look-at view matrix (right-handed, Y-up view space)
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Create the intermediate coordinate flip that converts Y-up view space
    /// into the Y-down, Z-forward convention the projection expects
    fn clip_coordinate_transform() -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();

        // Depth maps to [0, 1]; w receives the view-space distance so the
        // perspective divide happens after rasterization.
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;

        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn clip_coordinate_transform() -> Mat4 {
        // Flip Y (up becomes down) and Z (forward becomes into the screen).
        Mat4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, -1.0, 0.0, 0.0,
            0.0, 0.0, -1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perspective_maps_near_to_zero_and_far_to_one() {
        let proj = Mat4::perspective(deg_to_rad(60.0), 16.0 / 9.0, 0.1, 100.0);

        let near_point = proj * Vec4::new(0.0, 0.0, 0.1, 1.0);
        let far_point = proj * Vec4::new(0.0, 0.0, 100.0, 1.0);

        assert_relative_eq!(near_point.z / near_point.w, 0.0, epsilon = 1e-6);
        assert_relative_eq!(far_point.z / far_point.w, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn look_at_centers_the_target_on_the_view_axis() {
        let view = Mat4::look_at(
            Vec3::new(0.0, 2.0, 5.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );

        let target_view = view * Vec4::new(0.0, 2.0, 0.0, 1.0);
        assert_relative_eq!(target_view.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(target_view.y, 0.0, epsilon = 1e-6);
        // Right-handed view space looks down -Z.
        assert_relative_eq!(target_view.z, -5.0, epsilon = 1e-5);
    }
}
