//! Render resources: target pool, materials, ambient lighting

pub mod lighting;
pub mod materials;
pub mod targets;

pub use lighting::{AmbientRefresh, AmbientSnapshot, AmbientSource};
pub use materials::{BoundaryKeyword, Material, MaterialId, MaterialKeywords};
pub use targets::{MaskTargets, TargetPool};
