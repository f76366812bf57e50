//! # Underwater Engine
//!
//! Screen-space underwater visibility masking for real-time water rendering.
//!
//! For every screen pixel the pipeline decides whether the viewer's line of
//! sight passes through water before hitting anything else, and produces a
//! compact mask plus auxiliary depth buffers that a downstream compositor
//! uses to apply underwater treatment.
//!
//! ## Pipeline
//!
//! - **Target pool**: mask and boundary render targets whose lifetime tracks
//!   viewport resolution
//! - **Boundary rasterizer**: depth passes over finite water-volume geometry
//! - **Mask renderer**: horizon pass plus frustum-culled surface tiles
//! - **Artifact corrector**: compute pass repairing isolated mask texels
//! - **Compositor**: per-camera effect applying the underwater treatment
//!
//! The core never talks to a graphics API directly. Render targets, draw
//! submission, and compute dispatch are reached through the collaborator
//! traits in [`render::api`]; a reference CPU implementation lives in
//! [`render::backends::software`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use underwater_engine::prelude::*;
//! use underwater_engine::render::backends::software::SoftwareBackend;
//!
//! let mut backend = SoftwareBackend::new();
//! let config = UnderwaterConfig::default();
//!
//! let surface_material = Material::new(MaterialId(0), "water-surface")
//!     .with_keyword(MaterialKeywords::UNDERWATER);
//! let materials = UnderwaterMaterials {
//!     mask: Some(Material::new(MaterialId(1), "underwater-mask")),
//!     boundary: None,
//!     compositor: Some(Material::new(MaterialId(2), "underwater-compositor")),
//! };
//!
//! let mut effect = UnderwaterEffect::new(config);
//! effect
//!     .setup(materials, &surface_material, &mut backend)
//!     .expect("underwater effect setup");
//! ```

pub mod config;
pub mod foundation;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::config::{Config, ConfigError, UnderwaterConfig};
    pub use crate::foundation::math::{Mat4, Mat4Ext, Vec3, Vec4};
    pub use crate::render::api::{
        ComputeDispatch, DrawEncoder, KernelHandle, MeshHandle, RenderBackend, TargetAllocator,
        TargetDesc, TargetFormat, TargetHandle,
    };
    pub use crate::render::primitives::{Aabb, CameraView, DepthConvention, Frustum};
    pub use crate::render::resources::{
        AmbientRefresh, AmbientSnapshot, AmbientSource, Material, MaterialId, MaterialKeywords,
    };
    pub use crate::render::systems::underwater::{
        BoundaryGeometry, BoundaryMode, EffectState, MaskOutputs, SurfaceTile, SurfaceTileSet,
        UnderwaterEffect, UnderwaterMaterials,
    };
    pub use crate::render::{RenderError, RenderResult};
}
