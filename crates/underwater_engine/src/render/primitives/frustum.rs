//! Frustum planes and bounding volumes for visibility culling

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Axis-Aligned Bounding Box for culling queries
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half-extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Plane defined by a normal and distance from origin
///
/// Satisfies `normal · p + distance = 0` for points `p` on the plane.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Normal vector (normalized on construction)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Build a plane from raw coefficients (a, b, c, d), normalizing so the
    /// normal is unit length. A degenerate plane (zero normal) never culls.
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = Vec3::new(coefficients.x, coefficients.y, coefficients.z);
        let length = normal.magnitude();

        if length > 0.0 {
            Self {
                normal: normal / length,
                distance: coefficients.w / length,
            }
        } else {
            Self {
                normal: Vec3::zeros(),
                distance: 0.0,
            }
        }
    }

    /// Signed distance from the plane to a point; positive on the side the
    /// normal points to
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// View frustum represented by six planes with inward-facing normals
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb–Hartmann extraction: each plane is a sum or difference of two
    /// matrix rows. The near plane uses row 2 alone because the projection
    /// maps depth to [0, 1] rather than [-1, 1]. For reversed-depth
    /// projections the near/far labels swap but the plane set is the same.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row = |i: usize| Vec4::new(vp[(i, 0)], vp[(i, 1)], vp[(i, 2)], vp[(i, 3)]);
        let r3 = row(3);

        Self {
            planes: [
                Plane::from_coefficients(r3 + row(0)), // left
                Plane::from_coefficients(r3 - row(0)), // right
                Plane::from_coefficients(r3 + row(1)), // bottom
                Plane::from_coefficients(r3 - row(1)), // top
                Plane::from_coefficients(row(2)),      // near
                Plane::from_coefficients(r3 - row(2)), // far
            ],
        }
    }

    /// Check if an AABB is inside or intersects the frustum
    ///
    /// Exact plane/box separating-axis rejection: the box is outside exactly
    /// when its most-positive vertex relative to some plane's normal still
    /// lies on the negative side of that plane.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 {
                p.x = aabb.max.x;
            }
            if plane.normal.y >= 0.0 {
                p.y = aabb.max.y;
            }
            if plane.normal.z >= 0.0 {
                p.z = aabb.max.z;
            }

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }

        true
    }
}
