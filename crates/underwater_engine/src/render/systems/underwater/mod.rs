//! The underwater masking and compositing pipeline
//!
//! Work flows strictly downstream each frame: camera state feeds the depth
//! parameter derivation, boundary and mask rasterization write the mask
//! target pair, the artifact corrector repairs silhouette texels, and the
//! compositor blends the final image. All GPU work is issued in order
//! through the collaborator traits in [`crate::render::api`].

pub mod artifacts;
pub mod boundary;
pub mod compositor;
pub mod depth;
pub mod mask;
pub mod tiles;

pub use artifacts::ArtifactCorrector;
pub use boundary::{BoundaryGeometry, BoundaryMode};
pub use compositor::{EffectState, UnderwaterEffect, UnderwaterMaterials};
pub use tiles::{SurfaceTile, SurfaceTileSet, TileKey};

use crate::render::api::TargetHandle;

/// Shader pass indices on the mask material
pub mod pass {
    /// Rasterizes visible surface tiles into the mask
    pub const SURFACE_MASK: u32 = 0;
    /// Full-screen horizon triangle at the virtual far plane
    pub const HORIZON_MASK: u32 = 1;
    /// Boundary geometry front faces, depth only
    pub const BOUNDARY_FRONT: u32 = 0;
    /// Boundary geometry back faces, depth only
    pub const BOUNDARY_BACK: u32 = 1;
    /// Boundary interior marker written into the mask depth/stencil target
    pub const BOUNDARY_INTERIOR: u32 = 2;
}

/// Material parameter names shared with the shaders
pub mod param {
    /// Depth-buffer value of the virtual horizon plane
    pub const FAR_PLANE_OFFSET: &str = "far_plane_offset";
    /// Inverse view-projection matrix for world-position reconstruction
    pub const INV_VIEW_PROJECTION: &str = "inv_view_projection";
    /// Classification value the horizon pass writes beyond all geometry
    pub const HORIZON_MASK_VALUE: &str = "horizon_mask_value";
    /// Mask texture sampler on the compositor material
    pub const MASK_TEXTURE: &str = "mask_texture";
    /// Mask depth sampler on the compositor material
    pub const MASK_DEPTH_TEXTURE: &str = "mask_depth_texture";
    /// Boundary front-face depth sampler
    pub const BOUNDARY_FRONT_TEXTURE: &str = "boundary_front_depth";
    /// Boundary back-face depth sampler
    pub const BOUNDARY_BACK_TEXTURE: &str = "boundary_back_depth";
    /// Ambient spherical-harmonics coefficient block
    pub const AMBIENT_COEFFICIENTS: &str = "ambient_coefficients";
}

/// Name of the artifact-correction compute kernel
pub const KERNEL_FILL_MASK_ARTIFACTS: &str = "fill_mask_artifacts";

/// Render targets produced by one camera's mask pass
#[derive(Debug, Clone, Copy)]
pub struct MaskOutputs {
    /// Per-pixel underwater classification
    pub mask: TargetHandle,
    /// Depth backing the mask (carries the interior marker in volume modes)
    pub mask_depth: TargetHandle,
    /// Boundary front-face depth, present in non-full-screen modes
    pub boundary_front: Option<TargetHandle>,
    /// Boundary back-face depth, present when the mode has back faces
    pub boundary_back: Option<TargetHandle>,
}
