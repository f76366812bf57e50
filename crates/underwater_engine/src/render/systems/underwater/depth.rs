//! Depth parameter derivation for the horizon pass
//!
//! The horizon is rasterized as a full-screen triangle at a configurable
//! fraction of the far clip distance. The triangle carries no geometry, so
//! the depth value it writes has to be derived from the camera's clip
//! planes and the Z-buffer convention rather than looked up.

use crate::render::primitives::DepthConvention;

/// Depth-buffer write value for a plane at `multiplier` of the far distance
///
/// Mirrors the platform Z-buffer parameterization: with
/// `paramY = 1, paramX = f/n - 1` for reversed buffers and
/// `paramY = f/n, paramX = 1 - paramY` for standard buffers, the linear
/// 0..1 depth `multiplier` maps to the buffer value
/// `(1 - paramY * m) / (paramX * m)`.
///
/// Cheap enough to recompute unconditionally every frame; callers must not
/// cache it across camera or configuration changes.
pub fn horizon_depth_value(
    near: f32,
    far: f32,
    convention: DepthConvention,
    multiplier: f32,
) -> f32 {
    let (param_x, param_y) = match convention {
        DepthConvention::Reversed => (far / near - 1.0, 1.0),
        DepthConvention::Standard => {
            let param_y = far / near;
            (1.0 - param_y, param_y)
        }
    };

    (1.0 - param_y * multiplier) / (param_x * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NEAR: f32 = 0.1;
    const FAR: f32 = 1000.0;

    #[test]
    fn standard_buffer_reaches_one_at_the_far_plane() {
        let value = horizon_depth_value(NEAR, FAR, DepthConvention::Standard, 1.0);
        assert_relative_eq!(value, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn reversed_buffer_reaches_zero_at_the_far_plane() {
        let value = horizon_depth_value(NEAR, FAR, DepthConvention::Reversed, 1.0);
        assert_relative_eq!(value, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn values_stay_inside_the_depth_range() {
        for convention in [DepthConvention::Standard, DepthConvention::Reversed] {
            for step in 1..=20 {
                let m = step as f32 / 20.0;
                let value = horizon_depth_value(NEAR, FAR, convention, m);
                assert!(
                    (0.0..=1.0).contains(&value),
                    "{convention:?} m={m}: {value} outside depth range"
                );
            }
        }
    }

    #[test]
    fn standard_value_increases_toward_the_far_plane() {
        let mut previous = horizon_depth_value(NEAR, FAR, DepthConvention::Standard, 0.05);
        for step in 2..=20 {
            let m = step as f32 * 0.05;
            let value = horizon_depth_value(NEAR, FAR, DepthConvention::Standard, m);
            assert!(value > previous, "not increasing at m={m}");
            previous = value;
        }
    }

    #[test]
    fn reversed_value_decreases_toward_the_far_plane() {
        let mut previous = horizon_depth_value(NEAR, FAR, DepthConvention::Reversed, 0.05);
        for step in 2..=20 {
            let m = step as f32 * 0.05;
            let value = horizon_depth_value(NEAR, FAR, DepthConvention::Reversed, m);
            assert!(value < previous, "not decreasing at m={m}");
            previous = value;
        }
    }

    #[test]
    fn conventions_agree_on_the_represented_distance() {
        // Both conventions describe the same plane; converting the buffer
        // value back to linear eye-space depth must agree.
        let m = 0.68;
        let standard = horizon_depth_value(NEAR, FAR, DepthConvention::Standard, m);
        let reversed = horizon_depth_value(NEAR, FAR, DepthConvention::Reversed, m);

        // linear = 1 / (paramX * value + paramY), in units of the far plane.
        let y_std = FAR / NEAR;
        let x_std = 1.0 - y_std;
        let linear_standard = 1.0 / (x_std * standard + y_std);

        let y_rev = 1.0;
        let x_rev = FAR / NEAR - 1.0;
        let linear_reversed = 1.0 / (x_rev * reversed + y_rev);

        // f32 cancellation in the standard-buffer form is severe at these
        // clip ratios, hence the loose tolerance.
        assert_relative_eq!(linear_standard, m, epsilon = 1e-2);
        assert_relative_eq!(linear_reversed, m, epsilon = 1e-2);
    }
}
