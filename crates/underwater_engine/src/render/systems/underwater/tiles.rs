//! Surface tiles and per-frame bind bookkeeping
//!
//! The water surface is rendered as a set of tiles, each with world-space
//! bounds for culling and a draw handle. Binding a tile's wave data is
//! expensive and must happen at most once per frame no matter how many
//! passes or cameras touch the tile, so each tile carries the epoch of the
//! frame it was last bound in, compared against a global counter owned by
//! the set. A boolean would go stale as soon as a second camera rendered in
//! the same frame; the epoch comparison cannot.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::Mat4;
use crate::render::api::MeshHandle;
use crate::render::primitives::Aabb;

new_key_type! {
    /// Stable key for a tile in a [`SurfaceTileSet`]
    pub struct TileKey;
}

/// A renderable unit of the water surface
#[derive(Debug, Clone)]
pub struct SurfaceTile {
    /// Draw handle for the tile's mesh
    pub mesh: MeshHandle,
    /// World transform applied when drawing
    pub transform: Mat4,
    /// World-space bounds used for frustum culling
    pub bounds: Aabb,
    /// Disabled tiles are skipped by the mask pass
    pub enabled: bool,
    bound_epoch: u64,
}

impl SurfaceTile {
    /// Create an enabled tile with an identity transform
    pub fn new(mesh: MeshHandle, bounds: Aabb) -> Self {
        Self {
            mesh,
            transform: Mat4::identity(),
            bounds,
            enabled: true,
            bound_epoch: 0,
        }
    }

    /// Epoch of the frame this tile's data was last bound in
    pub fn bound_epoch(&self) -> u64 {
        self.bound_epoch
    }
}

/// The set of candidate surface tiles plus the global frame epoch
#[derive(Debug, Default)]
pub struct SurfaceTileSet {
    tiles: SlotMap<TileKey, SurfaceTile>,
    epoch: u64,
}

impl SurfaceTileSet {
    /// Create an empty set at epoch 1
    pub fn new() -> Self {
        Self {
            tiles: SlotMap::with_key(),
            epoch: 1,
        }
    }

    /// Add a tile, returning its key
    pub fn insert(&mut self, tile: SurfaceTile) -> TileKey {
        self.tiles.insert(tile)
    }

    /// Remove a tile
    pub fn remove(&mut self, key: TileKey) -> Option<SurfaceTile> {
        self.tiles.remove(key)
    }

    /// Borrow a tile
    pub fn get(&self, key: TileKey) -> Option<&SurfaceTile> {
        self.tiles.get(key)
    }

    /// Mutably borrow a tile
    pub fn get_mut(&mut self, key: TileKey) -> Option<&mut SurfaceTile> {
        self.tiles.get_mut(key)
    }

    /// Number of tiles in the set
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True if the set holds no tiles
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Keys of all tiles, in storage order
    pub fn keys(&self) -> Vec<TileKey> {
        self.tiles.keys().collect()
    }

    /// Advance the frame epoch
    ///
    /// Call exactly once per frame, before any camera's mask pass. Every
    /// tile becomes bindable again; tiles that are never drawn this frame
    /// are never touched.
    pub fn begin_frame(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Current frame epoch
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True if the tile has not yet been bound this frame
    pub fn needs_bind(&self, key: TileKey) -> bool {
        self.tiles
            .get(key)
            .is_some_and(|tile| tile.bound_epoch != self.epoch)
    }

    /// Record that the tile's data was bound this frame
    pub fn mark_bound(&mut self, key: TileKey) {
        let epoch = self.epoch;
        if let Some(tile) = self.tiles.get_mut(key) {
            tile.bound_epoch = epoch;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    fn tile() -> SurfaceTile {
        SurfaceTile::new(
            MeshHandle(1),
            Aabb::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)),
        )
    }

    #[test]
    fn fresh_tiles_need_binding() {
        let mut set = SurfaceTileSet::new();
        let key = set.insert(tile());
        assert!(set.needs_bind(key));
    }

    #[test]
    fn binding_is_once_per_epoch() {
        let mut set = SurfaceTileSet::new();
        let key = set.insert(tile());

        set.mark_bound(key);
        assert!(!set.needs_bind(key));

        // A second pass in the same frame sees the tile as already bound.
        assert!(!set.needs_bind(key));

        set.begin_frame();
        assert!(set.needs_bind(key));
    }

    #[test]
    fn removed_tiles_never_need_binding() {
        let mut set = SurfaceTileSet::new();
        let key = set.insert(tile());
        set.remove(key);
        assert!(!set.needs_bind(key));
    }
}
