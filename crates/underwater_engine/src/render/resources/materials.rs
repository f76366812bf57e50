//! Material state shared between the core and its draw backend
//!
//! A [`Material`] is the core's view of a shader instance: named parameters
//! plus keyword state. The shader itself lives with the collaborator that
//! owns the graphics device; the core only toggles features and uploads
//! values.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::foundation::math::Mat4;
use crate::render::api::TargetHandle;

bitflags! {
    /// Independent shader feature keywords
    ///
    /// These may be combined freely; the mutually-exclusive boundary group
    /// is [`BoundaryKeyword`] instead.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MaterialKeywords: u32 {
        /// Underwater treatment is compiled into the surface shader
        const UNDERWATER = 1 << 0;
        /// A finite water boundary is active (any non-full-screen mode)
        const BOUNDARY = 1 << 1;
        /// Meniscus overlay at the water line
        const MENISCUS = 1 << 2;
        /// Single-pass stereo instancing
        const STEREO_INSTANCING = 1 << 3;
    }
}

/// The mutually-exclusive boundary-representation keyword group
///
/// Enabling two members of this group at once is undefined behaviour in the
/// shaders, so the group is a single enum value: setting one member
/// implicitly clears the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryKeyword {
    /// No boundary-specific variant
    #[default]
    None,
    /// Boundary is a single-sided 2D silhouette
    Silhouette2D,
    /// Boundary has back faces (thin shell or closed volume)
    BackFace,
}

/// Unique identifier for materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// Material parameter block and keyword state
#[derive(Debug, Clone)]
pub struct Material {
    id: MaterialId,
    name: String,
    floats: HashMap<&'static str, f32>,
    matrices: HashMap<&'static str, Mat4>,
    targets: HashMap<&'static str, TargetHandle>,
    buffers: HashMap<&'static str, Vec<u8>>,
    keywords: MaterialKeywords,
    boundary: BoundaryKeyword,
}

impl Material {
    /// Create a material with no parameters and all keywords disabled
    pub fn new(id: MaterialId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            floats: HashMap::new(),
            matrices: HashMap::new(),
            targets: HashMap::new(),
            buffers: HashMap::new(),
            keywords: MaterialKeywords::empty(),
            boundary: BoundaryKeyword::None,
        }
    }

    /// Builder-style keyword enable
    #[must_use]
    pub fn with_keyword(mut self, keyword: MaterialKeywords) -> Self {
        self.keywords |= keyword;
        self
    }

    /// Material identifier
    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Debug name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a float parameter
    pub fn set_float(&mut self, name: &'static str, value: f32) {
        self.floats.insert(name, value);
    }

    /// Read a float parameter
    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    /// Set a matrix parameter
    pub fn set_matrix(&mut self, name: &'static str, value: Mat4) {
        self.matrices.insert(name, value);
    }

    /// Read a matrix parameter
    pub fn matrix(&self, name: &str) -> Option<&Mat4> {
        self.matrices.get(name)
    }

    /// Bind a render target under a sampler name
    pub fn set_target(&mut self, name: &'static str, target: TargetHandle) {
        self.targets.insert(name, target);
    }

    /// Read a bound render target
    pub fn target(&self, name: &str) -> Option<TargetHandle> {
        self.targets.get(name).copied()
    }

    /// Upload a raw constant-buffer block
    pub fn set_buffer(&mut self, name: &'static str, bytes: &[u8]) {
        self.buffers.insert(name, bytes.to_vec());
    }

    /// Read a raw constant-buffer block
    pub fn buffer(&self, name: &str) -> Option<&[u8]> {
        self.buffers.get(name).map(Vec::as_slice)
    }

    /// Enable or disable an independent keyword
    pub fn set_keyword(&mut self, keyword: MaterialKeywords, enabled: bool) {
        self.keywords.set(keyword, enabled);
    }

    /// True if every bit of `keyword` is enabled
    pub fn has_keyword(&self, keyword: MaterialKeywords) -> bool {
        self.keywords.contains(keyword)
    }

    /// Current independent keyword set
    pub fn keywords(&self) -> MaterialKeywords {
        self.keywords
    }

    /// Select the active member of the boundary keyword group, clearing the
    /// other members in the same assignment
    pub fn set_boundary_keyword(&mut self, keyword: BoundaryKeyword) {
        self.boundary = keyword;
    }

    /// Active member of the boundary keyword group
    pub fn boundary_keyword(&self) -> BoundaryKeyword {
        self.boundary
    }

    /// Copy every float parameter from another material
    ///
    /// Used by the compositor to mirror surface-material settings; existing
    /// parameters not present on `other` are kept.
    pub fn copy_float_params_from(&mut self, other: &Material) {
        for (name, value) in &other.floats {
            self.floats.insert(*name, *value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_group_members_are_exclusive() {
        let mut material = Material::new(MaterialId(0), "mask");

        material.set_boundary_keyword(BoundaryKeyword::Silhouette2D);
        assert_eq!(material.boundary_keyword(), BoundaryKeyword::Silhouette2D);

        material.set_boundary_keyword(BoundaryKeyword::BackFace);
        assert_eq!(material.boundary_keyword(), BoundaryKeyword::BackFace);

        material.set_boundary_keyword(BoundaryKeyword::None);
        assert_eq!(material.boundary_keyword(), BoundaryKeyword::None);
    }

    #[test]
    fn keyword_toggling() {
        let mut material = Material::new(MaterialId(0), "surface");

        material.set_keyword(MaterialKeywords::UNDERWATER, true);
        material.set_keyword(MaterialKeywords::MENISCUS, true);
        assert!(material.has_keyword(MaterialKeywords::UNDERWATER | MaterialKeywords::MENISCUS));

        material.set_keyword(MaterialKeywords::MENISCUS, false);
        assert!(!material.has_keyword(MaterialKeywords::MENISCUS));
        assert!(material.has_keyword(MaterialKeywords::UNDERWATER));
    }

    #[test]
    fn float_params_copy_over() {
        let mut surface = Material::new(MaterialId(0), "surface");
        surface.set_float("refraction_strength", 0.4);
        surface.set_float("fog_density", 0.12);

        let mut compositor = Material::new(MaterialId(1), "compositor");
        compositor.set_float("fog_density", 0.5);
        compositor.copy_float_params_from(&surface);

        assert_eq!(compositor.float("refraction_strength"), Some(0.4));
        assert_eq!(compositor.float("fog_density"), Some(0.12));
    }
}
