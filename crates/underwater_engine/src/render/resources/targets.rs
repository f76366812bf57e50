//! Resolution-tracking render target pool
//!
//! Owns the mask, mask-depth, and boundary front/back depth targets for one
//! camera. Targets are created lazily, reused while their dimensions match
//! the viewport, and recreated as a set when the resolution changes. The old
//! target is always released before its replacement is allocated. Release is
//! explicit via [`TargetPool::release_all`]; GPU resources are never left to
//! implicit finalization.

use crate::render::api::{TargetAllocator, TargetDesc, TargetFormat, TargetHandle};
use crate::render::RenderResult;

/// The mask color/depth pair returned by the pool
#[derive(Debug, Clone, Copy)]
pub struct MaskTargets {
    /// Per-pixel classification texture
    pub mask: TargetHandle,
    /// Depth buffer backing the mask pass (also carries the interior marker)
    pub mask_depth: TargetHandle,
}

#[derive(Debug, Clone, Copy)]
struct PooledTarget {
    handle: TargetHandle,
    width: u32,
    height: u32,
    layers: u32,
}

impl PooledTarget {
    fn matches(&self, width: u32, height: u32, layers: u32) -> bool {
        self.width == width && self.height == height && self.layers == layers
    }
}

/// Lazily managed render targets whose lifetime tracks viewport resolution
#[derive(Debug, Default)]
pub struct TargetPool {
    mask: Option<PooledTarget>,
    mask_depth: Option<PooledTarget>,
    boundary_front: Option<PooledTarget>,
    boundary_back: Option<PooledTarget>,
}

impl TargetPool {
    /// Create an empty pool; nothing is allocated until first use
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure the mask color/depth pair matches the requested dimensions
    ///
    /// The pair is invalidated atomically: a dimension change releases both
    /// targets before either replacement is allocated. MSAA is forced off
    /// (multisampled masks break sampling later) and the color target is
    /// writable from compute for the artifact-correction pass.
    pub fn ensure_mask_targets<A: TargetAllocator + ?Sized>(
        &mut self,
        alloc: &mut A,
        width: u32,
        height: u32,
        layers: u32,
        mask_format: TargetFormat,
    ) -> RenderResult<MaskTargets> {
        if let (Some(mask), Some(depth)) = (&self.mask, &self.mask_depth) {
            if mask.matches(width, height, layers) && depth.matches(width, height, layers) {
                return Ok(MaskTargets {
                    mask: mask.handle,
                    mask_depth: depth.handle,
                });
            }
        }

        Self::release_slot(&mut self.mask, alloc);
        Self::release_slot(&mut self.mask_depth, alloc);

        let mask = Self::allocate_slot(
            &mut self.mask,
            alloc,
            &TargetDesc {
                width,
                height,
                layers,
                format: mask_format,
                samples: 1,
                random_write: true,
            },
        )?;
        let mask_depth = Self::allocate_slot(
            &mut self.mask_depth,
            alloc,
            &TargetDesc {
                width,
                height,
                layers,
                format: TargetFormat::Depth24Stencil8,
                samples: 1,
                random_write: false,
            },
        )?;

        Ok(MaskTargets { mask, mask_depth })
    }

    /// Ensure the boundary depth target(s) match the requested dimensions
    ///
    /// The back-face target only exists for modes that need it; a stale back
    /// target left over from a reconfiguration is released here.
    pub fn ensure_boundary_targets<A: TargetAllocator + ?Sized>(
        &mut self,
        alloc: &mut A,
        width: u32,
        height: u32,
        layers: u32,
        back_face: bool,
    ) -> RenderResult<(TargetHandle, Option<TargetHandle>)> {
        let desc = TargetDesc {
            width,
            height,
            layers,
            format: TargetFormat::Depth24Stencil8,
            samples: 1,
            random_write: false,
        };

        let front = Self::ensure_slot(&mut self.boundary_front, alloc, &desc)?;

        let back = if back_face {
            Some(Self::ensure_slot(&mut self.boundary_back, alloc, &desc)?)
        } else {
            Self::release_slot(&mut self.boundary_back, alloc);
            None
        };

        Ok((front, back))
    }

    /// Handles of the current mask pair, if allocated
    pub fn mask_targets(&self) -> Option<MaskTargets> {
        match (&self.mask, &self.mask_depth) {
            (Some(mask), Some(depth)) => Some(MaskTargets {
                mask: mask.handle,
                mask_depth: depth.handle,
            }),
            _ => None,
        }
    }

    /// True if a boundary front-face target is currently allocated
    pub fn has_boundary_targets(&self) -> bool {
        self.boundary_front.is_some()
    }

    /// Release every target owned by the pool
    pub fn release_all<A: TargetAllocator + ?Sized>(&mut self, alloc: &mut A) {
        Self::release_slot(&mut self.mask, alloc);
        Self::release_slot(&mut self.mask_depth, alloc);
        Self::release_slot(&mut self.boundary_front, alloc);
        Self::release_slot(&mut self.boundary_back, alloc);
    }

    fn ensure_slot<A: TargetAllocator + ?Sized>(
        slot: &mut Option<PooledTarget>,
        alloc: &mut A,
        desc: &TargetDesc,
    ) -> RenderResult<TargetHandle> {
        if let Some(existing) = slot {
            if existing.matches(desc.width, desc.height, desc.layers) {
                return Ok(existing.handle);
            }
        }

        Self::release_slot(slot, alloc);
        Self::allocate_slot(slot, alloc, desc)
    }

    fn allocate_slot<A: TargetAllocator + ?Sized>(
        slot: &mut Option<PooledTarget>,
        alloc: &mut A,
        desc: &TargetDesc,
    ) -> RenderResult<TargetHandle> {
        let handle = alloc.allocate(desc)?;
        *slot = Some(PooledTarget {
            handle,
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
        });
        Ok(handle)
    }

    fn release_slot<A: TargetAllocator + ?Sized>(slot: &mut Option<PooledTarget>, alloc: &mut A) {
        if let Some(target) = slot.take() {
            alloc.release(target.handle);
        }
    }
}
