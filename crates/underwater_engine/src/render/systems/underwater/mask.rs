//! Visible-surface mask population
//!
//! Fills the mask target with a per-pixel underwater classification: first a
//! full-screen horizon triangle at the virtual far plane, then every surface
//! tile that survives frustum culling. The horizon must be drawn first —
//! real geometry drawn later has to win over the horizon default, so the
//! ordering is load-bearing.

use crate::render::api::DrawEncoder;
use crate::render::primitives::CameraView;
use crate::render::resources::Material;
use crate::render::systems::underwater::depth::horizon_depth_value;
use crate::render::systems::underwater::tiles::{SurfaceTileSet, TileKey};
use crate::render::systems::underwater::{param, pass};
use crate::render::RenderResult;

/// Rasterize the horizon and the visible surface tiles into the bound mask
/// target
///
/// The caller has already bound and cleared the mask target pair. Expensive
/// per-tile data binding runs through `bind_tile` at most once per frame
/// epoch; culled tiles are skipped without touching any state.
pub fn populate_mask<E: DrawEncoder + ?Sized>(
    encoder: &mut E,
    camera: &CameraView,
    tiles: &mut SurfaceTileSet,
    bind_tile: &mut dyn FnMut(TileKey),
    material: &mut Material,
    far_plane_multiplier: f32,
    skip_tiles: bool,
) -> RenderResult<()> {
    // Horizon first: a full-screen triangle at the derived depth gives every
    // pixel a default classification beyond all real geometry.
    let horizon_depth = horizon_depth_value(
        camera.near,
        camera.far,
        camera.depth_convention,
        far_plane_multiplier,
    );
    material.set_float(param::FAR_PLANE_OFFSET, horizon_depth);

    match camera.inverse_view_projection() {
        Some(inverse) => material.set_matrix(param::INV_VIEW_PROJECTION, inverse),
        None => log::warn!("view-projection matrix is singular; horizon reconstruction degraded"),
    }

    encoder.draw_fullscreen(material, pass::HORIZON_MASK);

    if skip_tiles {
        return Ok(());
    }

    // Frustum planes are recomputed from the current camera every frame.
    let frustum = camera.frustum();

    for key in tiles.keys() {
        let Some(tile) = tiles.get(key) else { continue };
        let (mesh, transform, bounds, enabled) =
            (tile.mesh, tile.transform, tile.bounds, tile.enabled);

        // Exact plane/box rejection; skipped tiles are never touched.
        if !frustum.intersects_aabb(&bounds) {
            continue;
        }
        if !enabled {
            continue;
        }

        if tiles.needs_bind(key) {
            bind_tile(key);
            tiles.mark_bound(key);
        }

        encoder.draw_mesh(mesh, &transform, material, pass::SURFACE_MASK);
    }

    Ok(())
}
