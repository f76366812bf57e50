//! Boundary geometry rasterization
//!
//! Finite water volumes (pools, lakes) are bounded by a user-supplied mesh.
//! Depending on the boundary mode, its front and back faces are rendered
//! into depth-only targets and, for closed volumes, an interior marker is
//! written into the mask depth/stencil target so the compositor can resolve
//! camera-inside-volume cases.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Mat4;
use crate::render::api::{MeshHandle, RenderBackend, TargetHandle};
use crate::render::resources::{BoundaryKeyword, Material, MaterialKeywords, TargetPool};
use crate::render::systems::underwater::pass;
use crate::render::RenderResult;

/// How the extent of the water is represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoundaryMode {
    /// No boundary geometry; the ocean is assumed infinite
    #[default]
    FullScreen,
    /// Single-sided silhouette surface; only front faces are rasterized
    Silhouette2D,
    /// Thin shell with both faces
    Geometry3D,
    /// Closed volume; the interior marker pass is mandatory
    GeometryVolume,
}

impl BoundaryMode {
    /// True for every mode that draws boundary geometry
    pub fn uses_geometry(self) -> bool {
        self != Self::FullScreen
    }

    /// True when back faces are rasterized
    pub fn has_back_face(self) -> bool {
        matches!(self, Self::Geometry3D | Self::GeometryVolume)
    }

    /// True when the interior marker pass primes the mask depth target
    ///
    /// The mask pass must then skip its depth clear or it would wipe the
    /// marker out again.
    pub fn primes_mask_depth(self) -> bool {
        self.has_back_face()
    }

    /// The member of the exclusive keyword group this mode selects
    pub fn boundary_keyword(self) -> BoundaryKeyword {
        match self {
            Self::FullScreen => BoundaryKeyword::None,
            Self::Silhouette2D => BoundaryKeyword::Silhouette2D,
            Self::Geometry3D | Self::GeometryVolume => BoundaryKeyword::BackFace,
        }
    }
}

/// Boundary mesh plus its world transform, supplied externally
#[derive(Debug, Clone)]
pub struct BoundaryGeometry {
    /// Draw handle of the boundary mesh
    pub mesh: MeshHandle,
    /// Local-to-world transform
    pub transform: Mat4,
}

/// Boundary depth targets written this frame
#[derive(Debug, Clone, Copy)]
pub struct BoundaryOutputs {
    /// Front-face depth
    pub front: TargetHandle,
    /// Back-face depth, for modes with back faces
    pub back: Option<TargetHandle>,
}

/// Mirror the mode's keyword selection onto the given materials
///
/// The exclusive group is assigned as a whole, which clears the previously
/// active member in the same step; a state with two members enabled cannot
/// be constructed.
pub fn apply_mode_keywords<'a>(
    mode: BoundaryMode,
    materials: impl IntoIterator<Item = &'a mut Material>,
) {
    for material in materials {
        material.set_boundary_keyword(mode.boundary_keyword());
        material.set_keyword(MaterialKeywords::BOUNDARY, mode.uses_geometry());
    }
}

/// Rasterize the boundary geometry for the active mode
///
/// Targets are acquired through the pool first; a target whose dimensions
/// already match is reused. The interior marker is drawn into `mask_depth`,
/// which therefore must be allocated before this call.
pub fn render_boundary<B: RenderBackend + ?Sized>(
    backend: &mut B,
    pool: &mut TargetPool,
    mode: BoundaryMode,
    geometry: &BoundaryGeometry,
    material: &Material,
    viewport: (u32, u32),
    layers: u32,
    mask_depth: TargetHandle,
) -> RenderResult<BoundaryOutputs> {
    debug_assert!(mode.uses_geometry(), "no boundary pass in full-screen mode");

    let (front, back) = pool.ensure_boundary_targets(
        backend,
        viewport.0,
        viewport.1,
        layers,
        mode.has_back_face(),
    )?;

    // Front faces.
    backend.set_render_target(None, Some(front));
    backend.clear(None, true);
    backend.draw_mesh(
        geometry.mesh,
        &geometry.transform,
        material,
        pass::BOUNDARY_FRONT,
    );

    if let Some(back) = back {
        // Back faces.
        backend.set_render_target(None, Some(back));
        backend.clear(None, true);
        backend.draw_mesh(
            geometry.mesh,
            &geometry.transform,
            material,
            pass::BOUNDARY_BACK,
        );

        // Interior marker, used downstream for point-in-volume tests.
        backend.set_render_target(None, Some(mask_depth));
        backend.clear(None, true);
        backend.draw_mesh(
            geometry.mesh,
            &geometry.transform,
            material,
            pass::BOUNDARY_INTERIOR,
        );
    }

    Ok(BoundaryOutputs { front, back })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::resources::MaterialId;

    #[test]
    fn mode_predicates() {
        assert!(!BoundaryMode::FullScreen.uses_geometry());
        assert!(BoundaryMode::Silhouette2D.uses_geometry());
        assert!(!BoundaryMode::Silhouette2D.has_back_face());
        assert!(BoundaryMode::Geometry3D.has_back_face());
        assert!(BoundaryMode::GeometryVolume.primes_mask_depth());
        assert!(!BoundaryMode::Silhouette2D.primes_mask_depth());
    }

    #[test]
    fn keywords_follow_the_mode() {
        let mut mask = Material::new(MaterialId(0), "mask");
        let mut surface = Material::new(MaterialId(1), "surface");

        apply_mode_keywords(BoundaryMode::Silhouette2D, [&mut mask, &mut surface]);
        assert_eq!(mask.boundary_keyword(), BoundaryKeyword::Silhouette2D);
        assert!(surface.has_keyword(MaterialKeywords::BOUNDARY));

        apply_mode_keywords(BoundaryMode::GeometryVolume, [&mut mask, &mut surface]);
        assert_eq!(mask.boundary_keyword(), BoundaryKeyword::BackFace);
        assert_eq!(surface.boundary_keyword(), BoundaryKeyword::BackFace);

        apply_mode_keywords(BoundaryMode::FullScreen, [&mut mask, &mut surface]);
        assert_eq!(mask.boundary_keyword(), BoundaryKeyword::None);
        assert!(!mask.has_keyword(MaterialKeywords::BOUNDARY));
        assert!(!surface.has_keyword(MaterialKeywords::BOUNDARY));
    }
}
