//! Collaborator traits for the rendering pipeline
//!
//! The underwater core issues all GPU work through these traits; the
//! surrounding renderer owns the actual device, window, and shaders. Every
//! resource crossing the boundary is an opaque handle.

use crate::foundation::math::Mat4;
use crate::render::resources::Material;
use crate::render::RenderResult;

/// Handle to a render target owned by the allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u64);

/// Handle to a compute kernel resolved by the dispatch backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelHandle(pub u64);

/// Handle to a mesh resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Texel format of a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    /// Single-channel 16-bit float color target
    R16Float,
    /// Single-channel 32-bit float color target
    R32Float,
    /// 24-bit depth with 8-bit stencil
    Depth24Stencil8,
}

/// Descriptor for a render target allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDesc {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Array layers (2 under single-pass stereo, else 1)
    pub layers: u32,
    /// Texel format
    pub format: TargetFormat,
    /// MSAA sample count
    pub samples: u32,
    /// Whether compute shaders may write the target directly
    pub random_write: bool,
}

/// Parameters for a compute dispatch
#[derive(Debug, Clone, Copy)]
pub struct ComputeParams {
    /// Target the kernel reads and writes
    pub target: TargetHandle,
    /// Single-pass stereo: the kernel processes both array layers
    pub stereo: bool,
}

/// Allocates and releases render targets on request
///
/// Acquisition must be cheap to call redundantly; the caller guarantees
/// explicit release on disable or destroy, never relying on finalization.
pub trait TargetAllocator {
    /// Allocate a target matching the descriptor
    fn allocate(&mut self, desc: &TargetDesc) -> RenderResult<TargetHandle>;

    /// Release a previously allocated target
    fn release(&mut self, target: TargetHandle);
}

/// Executes compute kernels by identifier
pub trait ComputeDispatch {
    /// Resolve a kernel by name
    fn find_kernel(&mut self, name: &str) -> RenderResult<KernelHandle>;

    /// The kernel's native thread-group size (x, y, z)
    fn kernel_group_size(&self, kernel: KernelHandle) -> (u32, u32, u32);

    /// Execute the kernel with the given thread-group counts
    fn dispatch(
        &mut self,
        kernel: KernelHandle,
        groups: (u32, u32, u32),
        params: &ComputeParams,
    ) -> RenderResult<()>;
}

/// Ordered per-frame command sink
///
/// Commands are queued in issue order and complete on the GPU in that order;
/// nothing here suspends the calling thread.
pub trait DrawEncoder {
    /// Bind color and/or depth targets for subsequent draws
    fn set_render_target(&mut self, color: Option<TargetHandle>, depth: Option<TargetHandle>);

    /// Clear the bound targets. `color` fills the color target with the
    /// given value; `clear_depth` resets the depth target to its far value.
    fn clear(&mut self, color: Option<f32>, clear_depth: bool);

    /// Draw a mesh with the given world transform, material, and pass index
    fn draw_mesh(&mut self, mesh: MeshHandle, transform: &Mat4, material: &Material, pass: u32);

    /// Draw a full-screen triangle (3 vertices, no vertex buffer)
    fn draw_fullscreen(&mut self, material: &Material, pass: u32);

    /// Copy `source` into `destination`, optionally through a material's
    /// full-screen pass
    fn blit(
        &mut self,
        source: TargetHandle,
        destination: TargetHandle,
        material: Option<&Material>,
    );
}

/// A backend implementing every collaborator contract
///
/// The pipeline entry points take this supertrait so a renderer exposing
/// one device object can serve allocation, drawing, and compute in a single
/// borrow. Implemented automatically.
pub trait RenderBackend: TargetAllocator + ComputeDispatch + DrawEncoder {}

impl<T: TargetAllocator + ComputeDispatch + DrawEncoder> RenderBackend for T {}
