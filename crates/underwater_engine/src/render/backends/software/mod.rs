//! Software reference backend
//!
//! Implements the collaborator traits on CPU texel buffers and records the
//! full command stream it receives. The demo app runs the pipeline against
//! it, and the end-to-end tests use the recorded events and texel contents
//! to observe pipeline behaviour without a GPU.
//!
//! Draw calls for real geometry are recorded but not rasterized; the
//! horizon pass, clears, blits, and the artifact-correction kernel operate
//! on actual texels so their contracts are observable.

use std::collections::HashMap;

use crate::foundation::math::Mat4;
use crate::render::api::{
    ComputeDispatch, ComputeParams, DrawEncoder, KernelHandle, MeshHandle, TargetAllocator,
    TargetDesc, TargetHandle,
};
use crate::render::resources::Material;
use crate::render::systems::underwater::{param, pass, KERNEL_FILL_MASK_ARTIFACTS};
use crate::render::{RenderError, RenderResult};

const FILL_MASK_KERNEL: KernelHandle = KernelHandle(1);
const FILL_MASK_GROUP_SIZE: (u32, u32, u32) = (8, 8, 1);

/// A command or resource event recorded by the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendEvent {
    /// A render target was allocated
    Allocate {
        /// Handle of the new target
        target: TargetHandle,
        /// Target width in texels
        width: u32,
        /// Target height in texels
        height: u32,
    },
    /// A render target was released
    Release {
        /// Handle of the released target
        target: TargetHandle,
    },
    /// Render targets were bound
    SetTarget {
        /// Bound color target
        color: Option<TargetHandle>,
        /// Bound depth target
        depth: Option<TargetHandle>,
    },
    /// Bound targets were cleared
    Clear {
        /// Color clear value, if the color target was cleared
        color: Option<f32>,
        /// Whether the depth target was cleared
        depth: bool,
    },
    /// A mesh draw was recorded
    MeshDraw {
        /// Mesh that was drawn
        mesh: MeshHandle,
        /// Shader pass index
        pass: u32,
    },
    /// A full-screen triangle draw was recorded
    FullscreenDraw {
        /// Shader pass index
        pass: u32,
    },
    /// A blit was recorded
    Blit {
        /// Source target
        source: TargetHandle,
        /// Destination target
        destination: TargetHandle,
        /// Whether a material pass was applied
        with_material: bool,
    },
    /// A compute kernel was dispatched
    Dispatch {
        /// Kernel that ran
        kernel: KernelHandle,
        /// Thread-group counts
        groups: (u32, u32, u32),
    },
}

/// CPU-side texture storage
#[derive(Debug, Clone)]
pub struct SoftwareTexture {
    /// Descriptor the texture was allocated with
    pub desc: TargetDesc,
    /// Texel values, row-major, layer-major
    pub texels: Vec<f32>,
}

impl SoftwareTexture {
    fn new(desc: TargetDesc) -> Self {
        let len = (desc.width * desc.height * desc.layers) as usize;
        Self {
            desc,
            texels: vec![0.0; len],
        }
    }

    /// Read one texel
    pub fn texel(&self, x: u32, y: u32, layer: u32) -> f32 {
        let index = ((layer * self.desc.height + y) * self.desc.width + x) as usize;
        self.texels[index]
    }

    /// Write one texel
    pub fn set_texel(&mut self, x: u32, y: u32, layer: u32, value: f32) {
        let index = ((layer * self.desc.height + y) * self.desc.width + x) as usize;
        self.texels[index] = value;
    }
}

/// Backend implementing every collaborator trait on the CPU
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    textures: HashMap<u64, SoftwareTexture>,
    next_target: u64,
    next_mesh: u64,
    current_color: Option<TargetHandle>,
    current_depth: Option<TargetHandle>,
    events: Vec<BackendEvent>,
}

impl SoftwareBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh and return its handle
    pub fn create_mesh(&mut self) -> MeshHandle {
        self.next_mesh += 1;
        MeshHandle(self.next_mesh)
    }

    /// The recorded command stream, in issue order
    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    /// Forget all recorded events
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Borrow a texture's CPU storage
    pub fn texture(&self, target: TargetHandle) -> Option<&SoftwareTexture> {
        self.textures.get(&target.0)
    }

    /// Mutably borrow a texture's CPU storage
    pub fn texture_mut(&mut self, target: TargetHandle) -> Option<&mut SoftwareTexture> {
        self.textures.get_mut(&target.0)
    }

    /// Number of currently live targets
    pub fn live_target_count(&self) -> usize {
        self.textures.len()
    }

    fn fill(&mut self, target: Option<TargetHandle>, value: f32) {
        if let Some(texture) = target.and_then(|t| self.textures.get_mut(&t.0)) {
            texture.texels.fill(value);
        }
    }
}

impl TargetAllocator for SoftwareBackend {
    fn allocate(&mut self, desc: &TargetDesc) -> RenderResult<TargetHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::ResourceAllocation(format!(
                "zero-area target {}x{}",
                desc.width, desc.height
            )));
        }

        self.next_target += 1;
        let handle = TargetHandle(self.next_target);
        self.textures.insert(handle.0, SoftwareTexture::new(*desc));
        self.events.push(BackendEvent::Allocate {
            target: handle,
            width: desc.width,
            height: desc.height,
        });
        Ok(handle)
    }

    fn release(&mut self, target: TargetHandle) {
        self.textures.remove(&target.0);
        self.events.push(BackendEvent::Release { target });
    }
}

impl DrawEncoder for SoftwareBackend {
    fn set_render_target(&mut self, color: Option<TargetHandle>, depth: Option<TargetHandle>) {
        self.current_color = color;
        self.current_depth = depth;
        self.events.push(BackendEvent::SetTarget { color, depth });
    }

    fn clear(&mut self, color: Option<f32>, clear_depth: bool) {
        if let Some(value) = color {
            self.fill(self.current_color, value);
        }
        if clear_depth {
            self.fill(self.current_depth, 1.0);
        }
        self.events.push(BackendEvent::Clear {
            color,
            depth: clear_depth,
        });
    }

    fn draw_mesh(&mut self, mesh: MeshHandle, _transform: &Mat4, _material: &Material, pass: u32) {
        self.events.push(BackendEvent::MeshDraw { mesh, pass });
    }

    fn draw_fullscreen(&mut self, material: &Material, pass: u32) {
        if pass == pass::HORIZON_MASK {
            let value = material.float(param::HORIZON_MASK_VALUE).unwrap_or(1.0);
            self.fill(self.current_color, value);
        }
        self.events.push(BackendEvent::FullscreenDraw { pass });
    }

    fn blit(
        &mut self,
        source: TargetHandle,
        destination: TargetHandle,
        material: Option<&Material>,
    ) {
        if let Some(texels) = self.textures.get(&source.0).map(|t| t.texels.clone()) {
            if let Some(dst) = self.textures.get_mut(&destination.0) {
                if dst.texels.len() == texels.len() {
                    dst.texels = texels;
                }
            }
        }
        self.events.push(BackendEvent::Blit {
            source,
            destination,
            with_material: material.is_some(),
        });
    }
}

impl ComputeDispatch for SoftwareBackend {
    fn find_kernel(&mut self, name: &str) -> RenderResult<KernelHandle> {
        if name == KERNEL_FILL_MASK_ARTIFACTS {
            Ok(FILL_MASK_KERNEL)
        } else {
            Err(RenderError::MissingKernel(name.to_string()))
        }
    }

    fn kernel_group_size(&self, _kernel: KernelHandle) -> (u32, u32, u32) {
        FILL_MASK_GROUP_SIZE
    }

    fn dispatch(
        &mut self,
        kernel: KernelHandle,
        groups: (u32, u32, u32),
        params: &ComputeParams,
    ) -> RenderResult<()> {
        self.events.push(BackendEvent::Dispatch { kernel, groups });

        if kernel != FILL_MASK_KERNEL {
            return Err(RenderError::MissingKernel(format!("{kernel:?}")));
        }

        let Some(texture) = self.textures.get_mut(&params.target.0) else {
            return Err(RenderError::Backend(format!(
                "dispatch target {:?} does not exist",
                params.target
            )));
        };

        let (width, height) = (texture.desc.width, texture.desc.height);
        let span_x = (groups.0 * FILL_MASK_GROUP_SIZE.0).min(width);
        let span_y = (groups.1 * FILL_MASK_GROUP_SIZE.1).min(height);
        let layers = groups.2.min(texture.desc.layers);

        // Majority repair over the 4-neighborhood, reading from a snapshot
        // so corrections do not cascade within one dispatch.
        let source = texture.texels.clone();
        let read =
            |x: u32, y: u32, layer: u32| -> f32 { source[((layer * height + y) * width + x) as usize] };

        for layer in 0..layers {
            for y in 1..span_y.saturating_sub(1) {
                for x in 1..span_x.saturating_sub(1) {
                    let center = read(x, y, layer);
                    let neighbors = [
                        read(x - 1, y, layer),
                        read(x + 1, y, layer),
                        read(x, y - 1, layer),
                        read(x, y + 1, layer),
                    ];

                    // A value held by at least three of the four neighbors
                    // is the unique majority, if one exists.
                    for candidate in neighbors {
                        let agreeing = neighbors.iter().filter(|n| **n == candidate).count();
                        if agreeing >= 3 {
                            if center != candidate {
                                texture.set_texel(x, y, layer, candidate);
                            }
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::TargetFormat;

    fn mask_desc(width: u32, height: u32) -> TargetDesc {
        TargetDesc {
            width,
            height,
            layers: 1,
            format: TargetFormat::R16Float,
            samples: 1,
            random_write: true,
        }
    }

    #[test]
    fn isolated_texel_is_repaired() {
        let mut backend = SoftwareBackend::new();
        let target = backend.allocate(&mask_desc(16, 16)).unwrap();

        backend.texture_mut(target).unwrap().texels.fill(1.0);
        backend.texture_mut(target).unwrap().set_texel(8, 8, 0, 0.0);

        backend
            .dispatch(
                FILL_MASK_KERNEL,
                (2, 2, 1),
                &ComputeParams {
                    target,
                    stereo: false,
                },
            )
            .unwrap();

        let texture = backend.texture(target).unwrap();
        assert!(texture.texels.iter().all(|t| *t == 1.0));
    }

    #[test]
    fn uniform_regions_are_left_alone() {
        let mut backend = SoftwareBackend::new();
        let target = backend.allocate(&mask_desc(16, 16)).unwrap();

        // Half-and-half split: a clean silhouette edge must survive.
        for y in 0..16 {
            for x in 0..16 {
                let value = if x < 8 { 0.0 } else { 1.0 };
                backend.texture_mut(target).unwrap().set_texel(x, y, 0, value);
            }
        }
        let before = backend.texture(target).unwrap().texels.clone();

        backend
            .dispatch(
                FILL_MASK_KERNEL,
                (2, 2, 1),
                &ComputeParams {
                    target,
                    stereo: false,
                },
            )
            .unwrap();

        assert_eq!(backend.texture(target).unwrap().texels, before);
    }

    #[test]
    fn stereo_dispatch_covers_both_layers() {
        let mut backend = SoftwareBackend::new();
        let mut desc = mask_desc(16, 16);
        desc.layers = 2;
        let target = backend.allocate(&desc).unwrap();

        for layer in 0..2 {
            for y in 0..16 {
                for x in 0..16 {
                    backend.texture_mut(target).unwrap().set_texel(x, y, layer, 1.0);
                }
            }
            backend.texture_mut(target).unwrap().set_texel(4, 4, layer, 0.0);
        }

        backend
            .dispatch(
                FILL_MASK_KERNEL,
                (2, 2, 2),
                &ComputeParams {
                    target,
                    stereo: true,
                },
            )
            .unwrap();

        let texture = backend.texture(target).unwrap();
        assert_eq!(texture.texel(4, 4, 0), 1.0);
        assert_eq!(texture.texel(4, 4, 1), 1.0);
    }

    #[test]
    fn unknown_kernel_name_is_an_error() {
        let mut backend = SoftwareBackend::new();
        assert!(backend.find_kernel("does_not_exist").is_err());
    }
}
