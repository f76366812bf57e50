//! Ambient lighting snapshot for the underwater compositor
//!
//! The compositor tints the underwater fog with the scene's ambient light.
//! Ambient terms arrive as a fixed-size spherical-harmonics-style
//! coefficient block captured from the lighting collaborator; the mask
//! pipeline never reads it.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// When the ambient snapshot is refreshed from its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AmbientRefresh {
    /// Sample the lighting source every frame
    #[default]
    EveryFrame,
    /// Sample once, then only when a refresh is requested
    OnDemand,
}

/// Second-order spherical-harmonics ambient coefficients
///
/// Nine RGB coefficients, each padded to four floats so the block can be
/// uploaded to a GPU constant buffer as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AmbientSnapshot {
    /// Coefficient rows: rgb in xyz, w unused
    pub coefficients: [[f32; 4]; 9],
}

impl AmbientSnapshot {
    /// All-zero ambient term (no ambient contribution)
    pub const BLACK: Self = Self {
        coefficients: [[0.0; 4]; 9],
    };

    /// Flat ambient term: only the constant band carries the given color
    pub fn uniform(r: f32, g: f32, b: f32) -> Self {
        let mut snapshot = Self::BLACK;
        snapshot.coefficients[0] = [r, g, b, 0.0];
        snapshot
    }

    /// The block as bytes, laid out for constant-buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for AmbientSnapshot {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Collaborator supplying the ambient coefficient snapshot on request
pub trait AmbientSource {
    /// Capture the current ambient term
    fn sample(&mut self) -> AmbientSnapshot;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_byte_layout_is_stable() {
        let snapshot = AmbientSnapshot::uniform(0.2, 0.3, 0.4);
        // 9 rows of 4 floats, 4 bytes each.
        assert_eq!(snapshot.as_bytes().len(), 9 * 4 * 4);
    }

    #[test]
    fn uniform_fills_only_the_constant_band() {
        let snapshot = AmbientSnapshot::uniform(1.0, 0.5, 0.25);
        assert_eq!(snapshot.coefficients[0], [1.0, 0.5, 0.25, 0.0]);
        assert_eq!(snapshot.coefficients[1..], [[0.0; 4]; 8]);
    }
}
