//! Mask artifact correction
//!
//! Rasterization leaves occasional isolated misclassified texels along the
//! mask's silhouette edges. A small compute pass repairs them by replacing
//! any texel inconsistent with the majority of its neighborhood. This is a
//! best-effort heuristic denoise, not an exact inverse of the artifact.

use crate::render::api::{ComputeDispatch, ComputeParams, KernelHandle, TargetHandle};
use crate::render::systems::underwater::KERNEL_FILL_MASK_ARTIFACTS;
use crate::render::RenderResult;

/// Dispatches the neighborhood-repair kernel over the finished mask
#[derive(Debug, Default)]
pub struct ArtifactCorrector {
    kernel: Option<KernelHandle>,
    group_size: (u32, u32, u32),
}

impl ArtifactCorrector {
    /// Create a corrector with no kernel resolved yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and cache the compute kernel; idempotent
    pub fn setup<C: ComputeDispatch + ?Sized>(&mut self, compute: &mut C) -> RenderResult<()> {
        if self.kernel.is_some() {
            return Ok(());
        }

        let kernel = compute.find_kernel(KERNEL_FILL_MASK_ARTIFACTS)?;
        self.group_size = compute.kernel_group_size(kernel);
        self.kernel = Some(kernel);
        Ok(())
    }

    /// Run the correction pass over the mask target
    ///
    /// No-op when `enabled` is false. Thread-group counts derive from the
    /// kernel's native group size; under single-pass stereo the dispatch
    /// covers both array layers.
    pub fn run<C: ComputeDispatch + ?Sized>(
        &self,
        compute: &mut C,
        mask: TargetHandle,
        width: u32,
        height: u32,
        stereo: bool,
        enabled: bool,
    ) -> RenderResult<()> {
        if !enabled {
            return Ok(());
        }

        let Some(kernel) = self.kernel else {
            return Err(crate::render::RenderError::MissingKernel(
                KERNEL_FILL_MASK_ARTIFACTS.to_string(),
            ));
        };

        let (group_x, group_y, _) = self.group_size;
        if group_x == 0 || group_y == 0 {
            return Err(crate::render::RenderError::Backend(
                "compute kernel reported a zero thread-group size".to_string(),
            ));
        }
        let groups = (
            width / group_x,
            height / group_y,
            if stereo { 2 } else { 1 },
        );

        compute.dispatch(kernel, groups, &ComputeParams { target: mask, stereo })
    }
}
